/// Line and polygon drawing.
pub mod draw;
/// Two-point distance measurement.
pub mod measure;
/// Feature selection and the single highlight.
pub mod picking;
/// Pointer events, coalescing and exclusive routing.
pub mod pointer;
/// Interaction modes and transactional switching between them.
pub mod tool_manager;
