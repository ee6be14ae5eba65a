use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use serde_json::{json, to_string, Value};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::error::{AppError, AppResult};
use crate::models::show_time_model::{ShowTimeFilter, ShowTimeRequest};
use crate::state::AppState;
use crate::utils::parse_object_id;

/// Connected schedule subscribers.
pub struct LiveFeed {
    clients: Vec<UnboundedSender<Message>>,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveFeed {
    pub fn new() -> Self {
        LiveFeed {
            clients: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, client: UnboundedSender<Message>) {
        self.clients.push(client);
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Sends the envelope to every client, dropping the ones whose socket
    /// has gone away.
    pub fn broadcast(&mut self, action_type: &str, status: &str, data: Value) {
        let message = json!({
            "action_type": action_type,
            "status": status,
            "data": data
        });
        let message_text = to_string(&message).unwrap_or_else(|_| "{}".to_string());
        self.clients.retain(|client| match client.send(Message::Text(message_text.clone())) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping disconnected schedule subscriber");
                false
            }
        });
    }
}

fn request_id(request: &Value) -> AppResult<mongodb::bson::oid::ObjectId> {
    let raw = request["id"]
        .as_str()
        .ok_or_else(|| AppError::BadRequest("id is missing".into()))?;
    parse_object_id(raw)
}

fn request_data(request: &Value) -> AppResult<ShowTimeRequest> {
    serde_json::from_value(request["data"].clone())
        .map_err(|e| AppError::BadRequest(format!("Failed to parse show time data: {e}")))
}

/// Runs one socket action through the show-time service.
pub async fn dispatch(state: &AppState, action: &str, request: &Value) -> AppResult<Value> {
    match action {
        "get_show_times" => {
            let show_times = state.show_times.list(ShowTimeFilter::All).await?;
            Ok(json!(show_times))
        }
        "add_show_time" => {
            let draft = request_data(request)?.into_new_show_time()?;
            let created = state.show_times.create(draft).await?;
            Ok(json!(created))
        }
        "update_show_time" => {
            let id = request_id(request)?;
            let draft = request_data(request)?.into_new_show_time()?;
            let updated = state.show_times.update(id, draft).await?;
            Ok(json!(updated))
        }
        "delete_show_time" => {
            let id = request_id(request)?;
            state.show_times.delete(id).await?;
            Ok(json!({"message": "Show time deleted successfully", "id": id.to_hex()}))
        }
        other => Err(AppError::BadRequest(format!("Unsupported action '{other}'"))),
    }
}

pub async fn websocket_handler(ws: WebSocketUpgrade, Extension(state): Extension<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = unbounded_channel::<Message>();

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = sender.send(message).await {
                tracing::debug!(error = %e, "Failed to send message");
                break;
            }
        }
    });

    state.live.lock().await.subscribe(tx);

    while let Some(Ok(Message::Text(text))) = receiver.next().await {
        let request: Value = serde_json::from_str(&text).unwrap_or_else(|_| {
            tracing::warn!("Failed to parse socket message as JSON");
            Value::Null
        });

        let Some(action_type) = request["action"].as_str() else {
            state
                .live
                .lock()
                .await
                .broadcast("error", "error", json!({"error": "Action type is missing"}));
            continue;
        };

        let (status, data) = match dispatch(&state, action_type, &request).await {
            Ok(data) => ("success", data),
            Err(e) => {
                let (_, code, message) = e.parts();
                ("error", json!({"error": message, "code": code}))
            }
        };
        state.live.lock().await.broadcast(action_type, status, data);
    }
}
