/// Bevy asset server backed resource source.
pub mod asset_source;
/// Turns an iteration into scene layers and frames the camera.
pub mod layer_resolver;
/// Per-layer load state reported to the frontend.
pub mod progress;
/// Request/poll contract between the resolver and whatever fetches documents.
pub mod resource_source;
/// Scripted in-memory source.
pub mod static_source;
