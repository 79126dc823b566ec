/// Measurements and shapes recorded during the session.
pub mod annotations;
/// Notifications the workspace raises for the host page.
pub mod events;
/// Mount, iteration and view orchestration.
pub mod orchestrator;
/// Bevy systems driving the workspace each frame.
pub mod plugin;
/// Which views an iteration supports and which one is active.
pub mod view;
