//! WebSocket message processing orchestrator
//!
//! Routes parsed client messages to the session handlers.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::state::AppState;

use super::{
    messages::IncomingMessage,
    relay::ClientRelay,
    session_handler::{handle_audio, handle_start, handle_stop},
    state::ConnectionState,
};

/// Process incoming WebSocket message based on its type
///
/// # Returns
/// * `bool` - true to continue processing, false to terminate the connection
#[inline]
pub async fn handle_incoming_message(
    msg: IncomingMessage,
    state: &Arc<RwLock<ConnectionState>>,
    relay: &ClientRelay,
    app_state: &Arc<AppState>,
) -> bool {
    match msg {
        IncomingMessage::Start {
            source_language,
            target_language,
        } => handle_start(source_language, target_language, state, relay, app_state).await,
        IncomingMessage::Audio { data } => handle_audio(data, state, relay).await,
        IncomingMessage::Stop => handle_stop(state, relay).await,
    }
}
