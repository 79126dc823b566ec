use crate::engine::camera::viewport_camera::{ViewportCamera, camera_controller};
use crate::engine::loading::asset_source::{AssetRequests, AssetResourceSource};
use crate::engine::scene::adapter::SceneContainer;
use crate::engine::scene::bevy_scene::{BevyScene, SceneRegistry};
use crate::engine::scene::labels::position_world_labels;
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::pointer::PointerEvent;
use crate::workspace::events::WorkspaceCommand;
use crate::workspace::orchestrator::Workspace;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

#[cfg(not(target_arch = "wasm32"))]
use crate::tools::tool_manager::InteractionMode;

/// The running workspace session.
#[derive(Resource)]
pub struct WorkspaceState(pub Workspace);

/// Mounts the scene at startup and drives the workspace once per frame: input, then
/// queued commands and loads, then notifications for the host page.
pub struct WorkspacePlugin;

impl Plugin for WorkspacePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneRegistry>()
            .init_resource::<ViewportCamera>()
            .init_resource::<AssetRequests>()
            .add_event::<WorkspaceCommand>()
            .add_systems(Startup, mount_scene)
            .add_systems(
                Update,
                (
                    collect_pointer_input,
                    handle_workspace_shortcuts,
                    drive_workspace,
                    publish_workspace_events,
                )
                    .chain(),
            )
            .add_systems(Update, (camera_controller, position_world_labels).chain())
            .add_systems(Last, unmount_on_exit);

        #[cfg(not(target_arch = "wasm32"))]
        app.add_systems(Startup, load_startup_iterations.after(mount_scene));
    }
}

fn mount_scene(
    mut state: ResMut<WorkspaceState>,
    mut scene: BevyScene,
    mut source: AssetResourceSource,
) {
    let workspace = &mut state.0;
    let container = SceneContainer::new(workspace.config().canvas.clone());
    if let Err(error) = workspace.mount(container, &mut scene, &mut source) {
        error!("Failed to mount scene: {}", error);
    }
}

/// Native builds have no host page; the iteration list comes from a file instead.
#[cfg(not(target_arch = "wasm32"))]
fn load_startup_iterations(mut commands: EventWriter<WorkspaceCommand>, state: Res<WorkspaceState>) {
    let Some(path) = state.0.config().iterations_file.as_deref() else {
        return;
    };

    let iterations = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| {
            crate::engine::assets::iteration::Iteration::list_from_json(&json)
                .map_err(|e| e.to_string())
        });

    match iterations {
        Ok(iterations) => {
            info!("Read {} iterations from {}", iterations.len(), path);
            commands.write(WorkspaceCommand::LoadIterations(iterations));
        }
        Err(error) => warn!("Could not read iterations from {}: {}", path, error),
    }
}

fn collect_pointer_input(
    mut state: ResMut<WorkspaceState>,
    mut cursor_moved: EventReader<CursorMoved>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let workspace = &mut state.0;
    for moved in cursor_moved.read() {
        workspace.push_pointer(PointerEvent::Move(moved.position));
    }

    let Some(cursor) = windows.single().ok().and_then(|w| w.cursor_position()) else {
        return;
    };
    if mouse_button.just_pressed(MouseButton::Left) {
        workspace.push_pointer(PointerEvent::Primary(cursor));
    }
    if mouse_button.just_pressed(MouseButton::Right) {
        workspace.push_pointer(PointerEvent::Secondary(cursor));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn handle_workspace_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands: EventWriter<WorkspaceCommand>,
) {
    let shortcuts = [
        (KeyCode::KeyM, InteractionMode::Measure),
        (KeyCode::KeyL, InteractionMode::DrawLine),
        (KeyCode::KeyP, InteractionMode::DrawPolygon),
        (KeyCode::Escape, InteractionMode::None),
    ];
    for (key, mode) in shortcuts {
        if keyboard.just_pressed(key) {
            commands.write(WorkspaceCommand::SetInteractionMode(mode));
        }
    }
}

/// Tools are driven over RPC in the browser.
#[cfg(target_arch = "wasm32")]
fn handle_workspace_shortcuts() {}

fn drive_workspace(
    mut state: ResMut<WorkspaceState>,
    mut commands: EventReader<WorkspaceCommand>,
    mut scene: BevyScene,
    mut source: AssetResourceSource,
) {
    let workspace = &mut state.0;
    for command in commands.read() {
        workspace.apply_command(command.clone(), &mut scene, &mut source);
    }
    workspace.tick(&mut scene, &mut source);
}

fn publish_workspace_events(
    mut state: ResMut<WorkspaceState>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for event in state.0.drain_events() {
        rpc_interface.send_notification(event.method(), event.params());
    }
}

fn unmount_on_exit(
    mut exits: EventReader<AppExit>,
    mut state: ResMut<WorkspaceState>,
    mut scene: BevyScene,
    mut source: AssetResourceSource,
) {
    if exits.read().next().is_some() {
        state.0.unmount(&mut scene, &mut source);
    }
}
