//! Shared render and coordinate constants for the survey workspace.

pub mod coordinate_system;
pub mod render_settings;
