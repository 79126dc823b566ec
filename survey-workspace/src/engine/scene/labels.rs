use bevy::prelude::*;

/// UI text pinned to a render-space position.
#[derive(Component, Debug, Clone, Copy)]
pub struct WorldLabel {
    pub anchor: Vec3,
    pub pixel_offset: Vec2,
}

/// Moves every label to its anchor's screen position. Labels whose anchor is behind the
/// camera are taken out of layout rather than hidden, so scene visibility stays intact.
pub fn position_world_labels(
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut labels: Query<(&WorldLabel, &mut Node)>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };

    for (label, mut node) in &mut labels {
        match camera.world_to_viewport(camera_transform, label.anchor) {
            Ok(screen) => {
                let position = screen + label.pixel_offset;
                node.display = Display::Flex;
                node.left = Val::Px(position.x);
                node.top = Val::Px(position.y);
            }
            Err(_) => node.display = Display::None,
        }
    }
}
