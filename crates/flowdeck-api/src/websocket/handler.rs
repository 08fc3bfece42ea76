//! WebSocket handler implementation.
//!
//! Each connection registers with the engine's broadcaster under its
//! connection id. A sender task merges lifecycle events and control replies
//! onto the socket; the receive loop handles control frames.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use flowdeck_engine::EventBroadcaster;

use crate::state::AppState;

use super::message::WsMessage;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4().to_string();
    info!("WebSocket connected: {}", connection_id);

    let broadcaster = state.engine.broadcaster().clone();
    let mut events = broadcaster.subscribe(connection_id.clone());

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<WsMessage>(100);

    // Send connected message
    let connected = WsMessage::Connected {
        connection_id: connection_id.clone(),
    };
    if let Ok(json) = serde_json::to_string(&connected) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    // Spawn sender task
    let sender_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                Some(msg) = rx.recv() => serde_json::to_string(&msg),
                Some(event) = events.recv() => serde_json::to_string(&event),
                else => break,
            };
            match frame {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Failed to serialize WebSocket frame: {}", e),
            }
        }
    });

    // Handle incoming messages
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                debug!("Received from {}: {}", connection_id, text);
                match serde_json::from_str::<WsMessage>(&text) {
                    Ok(ws_msg) => {
                        if let Err(e) =
                            handle_message(ws_msg, &tx, &connection_id, &broadcaster).await
                        {
                            error!("Error handling message: {}", e);
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse WebSocket message: {}", e);
                        let _ = tx
                            .send(WsMessage::error("PARSE_ERROR", "Failed to parse message"))
                            .await;
                    }
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: {}", connection_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                debug!("Ping received");
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Cleanup
    broadcaster.disconnect(&connection_id);
    sender_task.abort();
    info!("WebSocket disconnected: {}", connection_id);
}

/// Handle a parsed control frame.
async fn handle_message(
    msg: WsMessage,
    tx: &mpsc::Sender<WsMessage>,
    connection_id: &str,
    broadcaster: &EventBroadcaster,
) -> Result<(), String> {
    match msg {
        WsMessage::Ping { timestamp } => {
            tx.send(WsMessage::Pong { timestamp })
                .await
                .map_err(|e| e.to_string())?;
        }
        WsMessage::SubscribeWorkflow { workflow_id } => {
            broadcaster.subscribe_workflow(connection_id, &workflow_id);
        }
        WsMessage::UnsubscribeWorkflow { workflow_id } => {
            broadcaster.unsubscribe_workflow(connection_id, &workflow_id);
        }
        WsMessage::Pong { .. } => {
            debug!("Pong received from {}", connection_id);
        }
        _ => {
            warn!("Unhandled message type from {}", connection_id);
        }
    }
    Ok(())
}
