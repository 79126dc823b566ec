use bevy::prelude::*;
use bevy::window::PresentMode;

/// Primary window. On wasm32 the scene renders into the page's `canvas` element, which is
/// also the container the scene is mounted in.
pub fn create_window_config(canvas: &str) -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas: Some(canvas.to_string()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            title: format!("Survey workspace ({canvas})"),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }
    }
}
