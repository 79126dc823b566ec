/// Renderer-independent scene contract used by every tool.
pub mod adapter;
/// Bevy implementation of the scene contract.
pub mod bevy_scene;
/// Handles, entity descriptions and surface materials.
pub mod entity;
/// Screen-anchored text for world positions.
pub mod labels;
/// One scene per mount and the liveness token that guards async work.
pub mod mount;
/// Ray tests used by picking and ground projection.
pub mod ray;
/// In-memory scene that records every call.
pub mod recording;
