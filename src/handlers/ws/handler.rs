//! Axum WebSocket handler
//!
//! Upgrade handler plus the per-connection loop: one task writes outgoing
//! messages in order, the connection loop reads and routes client messages.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

use super::{
    error::WebSocketError,
    messages::{IncomingMessage, OutgoingMessage},
    processor::handle_incoming_message,
    relay::ClientRelay,
    session_handler::{handle_binary_audio, handle_disconnect},
    state::ConnectionState,
};

/// Outgoing queue depth per connection. Audio chunks dominate the traffic.
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// WebSocket interpretation handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let state = Arc::new(RwLock::new(ConnectionState::new()));
    let (message_tx, mut message_rx) = mpsc::channel::<OutgoingMessage>(CHANNEL_BUFFER_SIZE);
    let relay = ClientRelay::new(message_tx);

    let sender_task = tokio::spawn(async move {
        while let Some(message) = message_rx.recv().await {
            let json_str = match serde_json::to_string(&message) {
                Ok(json_str) => json_str,
                Err(e) => {
                    error!("Failed to serialize outgoing message: {}", e);
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json_str.into())).await {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    loop {
        match receiver.next().await {
            Some(Ok(msg)) => {
                if !process_message(msg, &state, &relay, &app_state).await {
                    break;
                }
            }
            Some(Err(e)) => {
                warn!("WebSocket error: {}", e);
                relay
                    .send_error(WebSocketError::WebSocket(e.to_string()))
                    .await;
                break;
            }
            None => {
                info!("WebSocket connection closed by client");
                break;
            }
        }
    }

    handle_disconnect(&state).await;
    sender_task.abort();

    info!("WebSocket connection terminated");
}

async fn process_message(
    msg: Message,
    state: &Arc<RwLock<ConnectionState>>,
    relay: &ClientRelay,
    app_state: &Arc<AppState>,
) -> bool {
    match msg {
        Message::Text(text) => {
            debug!("Received text message: {} bytes", text.len());

            let incoming_msg: IncomingMessage = match serde_json::from_str(&text) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("Failed to parse incoming message: {}", e);
                    relay
                        .send_error(WebSocketError::InvalidMessage(e.to_string()))
                        .await;
                    return true;
                }
            };

            handle_incoming_message(incoming_msg, state, relay, app_state).await
        }
        Message::Binary(data) => {
            debug!("Received binary message: {} bytes", data.len());
            handle_binary_audio(&data, state).await
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            info!("WebSocket connection closed by client");
            false
        }
    }
}
