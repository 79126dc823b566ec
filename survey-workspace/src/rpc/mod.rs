//! JSON-RPC 2.0 bridge between the workspace and the host page.
//!
//! The workspace runs inside an iframe and talks to its parent window over `postMessage`:
//!
//! ```text
//! Host page (parent window)  <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Evaluate against the workspace
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        │ <────────── Notification (no ID) ──────┤
//! ```
//!
//! Queries are answered from the workspace state in the frame they arrive. Mutating
//! requests are acknowledged once their parameters check out and are applied as
//! [`WorkspaceCommand`](crate::workspace::events::WorkspaceCommand)s later in the same
//! frame; a command the workspace then refuses is reported with a `command_rejected`
//! notification. A request without an id is applied but never answered.
//!
//! ## Requests
//!
//! ### Interaction
//! - `set_interaction_mode {mode}`: `none`, `measure` (or `distance`), `line`, `polygon`
//! - `get_interaction_mode`
//!
//! ### Iterations and views
//! - `load_iterations {iterations}`: replaces the list and shows the newest entry
//! - `select_iteration {id}`
//! - `set_active_view {view}`: `3d` or `2d`, only when the iteration has that layer
//! - `get_view_state`
//!
//! ### Annotations
//! - `get_finalized_shapes`
//! - `get_last_measurement`
//! - `clear_annotations`
//!
//! ### Vector layer
//! - `set_vector_style {colour?, opacity?}`
//! - `set_vector_visible {visible}`
//!
//! ## Notifications
//!
//! `interaction_mode_changed`, `feature_picked`, `measure_started`, `measure_updated`,
//! `measure_completed`, `shape_finalized`, `iteration_selected`, `view_changed`,
//! `layer_loaded`, `layer_failed`, `layers_settled`, `command_rejected`.
//!
//! ## Error Handling
//!
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error

/// JSON-RPC 2.0 bidirectional communication system for host page integration.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
