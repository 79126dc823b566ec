use crate::engine::assets::iteration::Iteration;
use crate::engine::core::config::parse_hex_colour;
use crate::tools::tool_manager::InteractionMode;
use crate::workspace::events::WorkspaceCommand;
use crate::workspace::orchestrator::Workspace;
use crate::workspace::plugin::WorkspaceState;
use crate::workspace::view::ActiveView;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

/// Resource managing bidirectional RPC communication between the host page and Bevy.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host page without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing the postMessage bridge for iframe deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    send_outgoing_messages,
                )
                    .chain(),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        if let Err(e) =
            window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register message listener: {:?}", e);
        }
    }

    // Ownership passes to JS so the listener outlives this system.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Messages received by the JS listener, waiting for the next frame.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    state: Res<WorkspaceState>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut workspace_commands: EventWriter<WorkspaceCommand>,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);
                let mut outcome = evaluate_request(&request, &state.0);

                if let Some(command) = outcome.command.take() {
                    workspace_commands.write(command);
                }
                if let Some(response) = outcome.into_response(request.id) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("Unparseable RPC message: {}", parse_error);
                rpc_interface.send_notification(
                    "debug_message",
                    json!({ "message": format!("Parse error: {}", parse_error) }),
                );
            }
        }
    }
}

/// What a request asks of the workspace: an immediate answer, and possibly a command
/// for the workspace to apply this frame.
#[derive(Debug)]
pub struct RpcOutcome {
    pub command: Option<WorkspaceCommand>,
    pub result: Result<Value, RpcError>,
}

impl RpcOutcome {
    fn answer(result: Result<Value, RpcError>) -> Self {
        Self {
            command: None,
            result,
        }
    }

    fn queue(command: WorkspaceCommand, result: Value) -> Self {
        Self {
            command: Some(command),
            result: Ok(result),
        }
    }

    /// Only requests carrying an id get a reply.
    pub fn into_response(self, id: Option<Value>) -> Option<RpcResponse> {
        let id = id?;
        let (result, error) = match self.result {
            Ok(value) => (Some(value), None),
            Err(error) => (None, Some(error)),
        };
        Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result,
            error,
            id: Some(id),
        })
    }
}

/// Evaluate a request against the current workspace. Queries are answered from its state;
/// mutations become a [`WorkspaceCommand`].
pub fn evaluate_request(request: &RpcRequest, workspace: &Workspace) -> RpcOutcome {
    match request.method.as_str() {
        "set_interaction_mode" => handle_set_interaction_mode(&request.params),
        "get_interaction_mode" => RpcOutcome::answer(Ok(json!({
            "mode": workspace.interaction_mode().as_str()
        }))),
        "load_iterations" => handle_load_iterations(&request.params),
        "select_iteration" => handle_select_iteration(&request.params),
        "set_active_view" => handle_set_active_view(&request.params),
        "get_view_state" => RpcOutcome::answer(
            serde_json::to_value(workspace.view_state())
                .map(|view| {
                    json!({
                        "iteration": workspace.selected_iteration().map(|it| it.id.clone()),
                        "view": view,
                        "loading": workspace.loading_progress().map(|progress| progress.to_json()),
                    })
                })
                .map_err(|e| RpcError::internal_error(&e.to_string())),
        ),
        "get_finalized_shapes" => {
            let shapes: Vec<Value> = workspace
                .finalized_shapes()
                .iter()
                .map(|shape| shape.to_json())
                .collect();
            RpcOutcome::answer(Ok(json!({ "shapes": shapes })))
        }
        "get_last_measurement" => RpcOutcome::answer(Ok(json!({
            "measurement": workspace.last_measurement().map(|m| m.to_json())
        }))),
        "clear_annotations" => {
            RpcOutcome::queue(WorkspaceCommand::ClearAnnotations, json!({ "success": true }))
        }
        "set_vector_style" => handle_set_vector_style(&request.params, workspace),
        "set_vector_visible" => handle_set_vector_visible(&request.params),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            RpcOutcome::answer(Err(RpcError::method_not_found(&request.method)))
        }
    }
}

fn handle_set_interaction_mode(params: &Value) -> RpcOutcome {
    #[derive(Deserialize)]
    struct ModeParams {
        mode: String,
    }

    let parsed = match serde_json::from_value::<ModeParams>(params.clone()) {
        Ok(parsed) => parsed,
        Err(_) => return RpcOutcome::answer(Err(RpcError::invalid_params("Expected 'mode' parameter"))),
    };
    let Some(mode) = InteractionMode::from_string(&parsed.mode) else {
        return RpcOutcome::answer(Err(RpcError::invalid_params(&format!(
            "Unknown interaction mode: {}",
            parsed.mode
        ))));
    };

    info!("Interaction mode requested over RPC: {}", mode.as_str());
    RpcOutcome::queue(
        WorkspaceCommand::SetInteractionMode(mode),
        json!({ "success": true, "mode": mode.as_str() }),
    )
}

fn handle_load_iterations(params: &Value) -> RpcOutcome {
    #[derive(Deserialize)]
    struct IterationParams {
        iterations: Vec<Iteration>,
    }

    match serde_json::from_value::<IterationParams>(params.clone()) {
        Ok(parsed) => {
            let count = parsed.iterations.len();
            RpcOutcome::queue(
                WorkspaceCommand::LoadIterations(parsed.iterations),
                json!({ "success": true, "count": count }),
            )
        }
        Err(e) => RpcOutcome::answer(Err(RpcError::invalid_params(&format!(
            "Expected 'iterations' array: {e}"
        )))),
    }
}

fn handle_select_iteration(params: &Value) -> RpcOutcome {
    #[derive(Deserialize)]
    struct SelectParams {
        id: String,
    }

    match serde_json::from_value::<SelectParams>(params.clone()) {
        Ok(parsed) => RpcOutcome::queue(
            WorkspaceCommand::SelectIteration(parsed.id.clone()),
            json!({ "success": true, "id": parsed.id }),
        ),
        Err(_) => RpcOutcome::answer(Err(RpcError::invalid_params("Expected 'id' parameter"))),
    }
}

fn handle_set_active_view(params: &Value) -> RpcOutcome {
    let view = params
        .get("view")
        .and_then(Value::as_str)
        .and_then(ActiveView::from_string);

    match view {
        Some(view) => RpcOutcome::queue(
            WorkspaceCommand::SetActiveView(view),
            json!({ "success": true, "view": view.as_str() }),
        ),
        None => RpcOutcome::answer(Err(RpcError::invalid_params(
            "Expected 'view' parameter of \"3d\" or \"2d\"",
        ))),
    }
}

/// Missing fields keep the current style.
fn handle_set_vector_style(params: &Value, workspace: &Workspace) -> RpcOutcome {
    #[derive(Deserialize)]
    struct StyleParams {
        colour: Option<String>,
        opacity: Option<f32>,
    }

    let parsed = match serde_json::from_value::<StyleParams>(params.clone()) {
        Ok(parsed) => parsed,
        Err(_) => {
            return RpcOutcome::answer(Err(RpcError::invalid_params(
                "Expected 'colour' and/or 'opacity' parameters",
            )));
        }
    };

    let mut style = workspace.vector_presentation().style;
    if let Some(hex) = &parsed.colour {
        match parse_hex_colour(hex) {
            Some(colour) => style.colour = colour,
            None => {
                return RpcOutcome::answer(Err(RpcError::invalid_params(&format!(
                    "`{hex}` is not a #RRGGBB colour"
                ))));
            }
        }
    }
    if let Some(opacity) = parsed.opacity {
        if !(0.0..=1.0).contains(&opacity) {
            return RpcOutcome::answer(Err(RpcError::invalid_params(
                "'opacity' must be between 0 and 1",
            )));
        }
        style.opacity = opacity;
    }

    RpcOutcome::queue(
        WorkspaceCommand::SetVectorStyle(style),
        json!({ "success": true, "opacity": style.opacity }),
    )
}

fn handle_set_vector_visible(params: &Value) -> RpcOutcome {
    match params.get("visible").and_then(Value::as_bool) {
        Some(visible) => RpcOutcome::queue(
            WorkspaceCommand::SetVectorVisible(visible),
            json!({ "success": true, "visible": visible }),
        ),
        None => RpcOutcome::answer(Err(RpcError::invalid_params(
            "Expected boolean 'visible' parameter",
        ))),
    }
}

/// Send queued notifications and responses to the host page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Responses follow notifications so state changes arrive before their acknowledgements.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Post a serialised message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}
