use bevy::input::mouse::MouseScrollUnit;
use bevy::math::EulerRot;
use bevy::{
    input::mouse::{MouseMotion, MouseWheel},
    prelude::*,
};
use constants::render_settings::{FRAMING_PITCH, TOP_DOWN_PITCH};

/// Position and orientation the viewport camera can rest at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
}

impl CameraPose {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Oblique pose from which the whole extent is visible.
    pub fn framing(center: Vec3, size: Vec3) -> Self {
        let distance = (size.length() * 0.9).max(20.0);
        let rotation = Quat::from_euler(EulerRot::YXZ, 0.0, FRAMING_PITCH, 0.0);
        Self {
            position: center + rotation * Vec3::Z * distance,
            pitch: FRAMING_PITCH,
            yaw: 0.0,
        }
    }

    /// Straight-down pose with north at the top of the screen.
    pub fn top_down(center: Vec3, radius: f32) -> Self {
        Self {
            position: center + Vec3::Y * (radius * 2.0).max(20.0),
            pitch: TOP_DOWN_PITCH,
            yaw: 0.0,
        }
    }
}

/// Timed interpolation between two poses.
#[derive(Debug, Clone, Copy)]
pub struct CameraFlight {
    from: CameraPose,
    to: CameraPose,
    elapsed: f32,
    duration: f32,
}

impl CameraFlight {
    fn sample(&self) -> CameraPose {
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        if t >= 1.0 {
            return self.to;
        }
        let eased = t * t * (3.0 - 2.0 * t);
        CameraPose {
            position: self.from.position.lerp(self.to.position, eased),
            pitch: self.from.pitch + (self.to.pitch - self.from.pitch) * eased,
            yaw: self.from.yaw + (self.to.yaw - self.from.yaw) * eased,
        }
    }
}

#[derive(Resource)]
pub struct ViewportCamera {
    pub focus_point: Vec3,
    pub height: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub flight: Option<CameraFlight>,
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self {
            focus_point: Vec3::new(0.0, 60.0, 80.0),
            height: 100.0,
            pitch: FRAMING_PITCH,
            yaw: 0.0,
            flight: None,
        }
    }
}

impl ViewportCamera {
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.focus_point,
            pitch: self.pitch,
            yaw: self.yaw,
        }
    }

    fn set_pose(&mut self, pose: CameraPose) {
        self.focus_point = pose.position;
        self.pitch = pose.pitch;
        self.yaw = pose.yaw;
    }

    /// Start a flight from the current pose. Non-positive durations jump immediately.
    pub fn fly_to(&mut self, to: CameraPose, duration_secs: f32) {
        self.height = (to.position.y).abs().max(1.0);
        if duration_secs <= 0.0 {
            self.flight = None;
            self.set_pose(to);
            return;
        }
        self.flight = Some(CameraFlight {
            from: self.pose(),
            to,
            elapsed: 0.0,
            duration: duration_secs,
        });
    }

    /// Advance an active flight, returns whether one is still running.
    pub fn advance_flight(&mut self, delta_secs: f32) -> bool {
        let Some(mut flight) = self.flight.take() else {
            return false;
        };
        flight.elapsed += delta_secs;
        self.set_pose(flight.sample());
        if flight.elapsed < flight.duration {
            self.flight = Some(flight);
            return true;
        }
        false
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Orbit with the middle button, dolly with the wheel, move with WASD/QE.
/// Manual input is ignored while a scripted flight is running.
pub fn camera_controller(
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
    mut maps_camera: ResMut<ViewportCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll_accum: f32 = scroll_events
        .read()
        .map(|ev| match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        })
        .sum();

    if maps_camera.advance_flight(time.delta_secs()) {
        let pose = maps_camera.pose();
        camera_transform.translation = pose.position;
        camera_transform.rotation = pose.rotation();
        return;
    }

    if mouse_button.pressed(MouseButton::Middle) && mouse_delta != Vec2::ZERO {
        let yaw_sens = 0.0035;
        let pitch_sens = 0.0030;
        maps_camera.yaw += -mouse_delta.x * yaw_sens;
        maps_camera.pitch += -mouse_delta.y * pitch_sens;
        maps_camera.pitch = maps_camera.pitch.clamp(-1.5707, 1.55);
    }

    let view_rot = Quat::from_euler(EulerRot::YXZ, maps_camera.yaw, maps_camera.pitch, 0.0);

    if scroll_accum.abs() > f32::EPSILON {
        let dolly_speed = (maps_camera.height * 0.2).clamp(0.5, 500.0);
        let forward = (view_rot * Vec3::Z).normalize();
        maps_camera.focus_point -= forward * (scroll_accum * dolly_speed);
    }

    let mut move_input = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        move_input.z -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        move_input.z += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        move_input.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        move_input.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyE) {
        move_input.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyQ) {
        move_input.y -= 1.0;
    }

    if move_input != Vec3::ZERO {
        let forward = (view_rot * Vec3::Z).normalize();
        let right = (view_rot * Vec3::X).normalize();

        // Shift = faster, ctrl = slower
        let mut speed = maps_camera.height.clamp(2.0, 200.0);
        if keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) {
            speed *= 3.5;
        }
        if keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]) {
            speed *= 0.25;
        }

        let world_delta = right * move_input.x + Vec3::Y * move_input.y + forward * move_input.z;
        maps_camera.focus_point += world_delta.normalize() * speed * time.delta_secs();
    }

    let target_rot = maps_camera.pose().rotation();
    let target_pos = maps_camera.focus_point;

    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    camera_transform.translation = camera_transform.translation.lerp(target_pos, lerp_speed);
    camera_transform.rotation = camera_transform.rotation.slerp(target_rot, lerp_speed);
}
