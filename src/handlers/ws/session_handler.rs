//! Start, audio and stop handling for a client connection

use std::sync::Arc;

use base64::prelude::*;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::core::language::DirectionPair;
use crate::core::session::DualSession;
use crate::state::AppState;

use super::{
    error::{WebSocketError, WebSocketResult},
    relay::ClientRelay,
    state::ConnectionState,
};

/// Pick the session languages, falling back to the configured defaults.
pub fn resolve_pair(
    source_language: Option<&str>,
    target_language: Option<&str>,
    config: &ServerConfig,
) -> WebSocketResult<DirectionPair> {
    let source = source_language.unwrap_or(&config.default_source_language);
    let target = target_language.unwrap_or(&config.default_target_language);
    DirectionPair::from_codes(source, target)
        .map_err(|e| WebSocketError::InvalidLanguagePair(e.to_string()))
}

/// Handle a `start` message
///
/// A stopped session still held by the connection is shut down before the new
/// one is opened. Starting while a session is running is rejected.
pub async fn handle_start(
    source_language: Option<String>,
    target_language: Option<String>,
    state: &Arc<RwLock<ConnectionState>>,
    relay: &ClientRelay,
    app_state: &Arc<AppState>,
) -> bool {
    if let Err(e) = start_session(
        source_language.as_deref(),
        target_language.as_deref(),
        state,
        relay,
        app_state,
    )
    .await
    {
        warn!("Start rejected: {}", e);
        relay.send_error(e).await;
    }
    true
}

async fn start_session(
    source_language: Option<&str>,
    target_language: Option<&str>,
    state: &Arc<RwLock<ConnectionState>>,
    relay: &ClientRelay,
    app_state: &Arc<AppState>,
) -> WebSocketResult<()> {
    let mut state_guard = state.write().await;
    if state_guard.running_session().is_some() {
        return Err(WebSocketError::SessionAlreadyStarted);
    }

    let pair = resolve_pair(source_language, target_language, &app_state.config)?;

    if let Some(previous) = state_guard.session.take() {
        debug!("[{}] Releasing stopped session", previous.id());
        previous.shutdown().await;
    }

    let session = DualSession::open(&app_state.core_state, pair, Arc::new(relay.clone()))
        .await
        .map_err(|e| WebSocketError::Connection(e.to_string()))?;
    info!("[{}] Session attached to connection", session.id());
    state_guard.session = Some(session);
    Ok(())
}

/// Handle a base64 `audio` message
pub async fn handle_audio(
    data: String,
    state: &Arc<RwLock<ConnectionState>>,
    relay: &ClientRelay,
) -> bool {
    match BASE64_STANDARD.decode(data.as_bytes()) {
        Ok(audio) => forward_audio(&audio, state).await,
        Err(e) => {
            relay
                .send_error(WebSocketError::InvalidAudio(e.to_string()))
                .await
        }
    }
    true
}

/// Handle a raw binary audio frame
pub async fn handle_binary_audio(data: &[u8], state: &Arc<RwLock<ConnectionState>>) -> bool {
    forward_audio(data, state).await;
    true
}

/// Audio arriving with no running session is dropped without a reply.
async fn forward_audio(audio: &[u8], state: &Arc<RwLock<ConnectionState>>) {
    let session = state.read().await.running_session();
    let Some(session) = session else {
        debug!("Dropping {} bytes of audio, no running session", audio.len());
        return;
    };
    if !session.send_audio(audio).await {
        debug!("[{}] Audio chunk not delivered upstream", session.id());
    }
}

/// Handle a `stop` message
///
/// Returns once the engine has delivered its last results or the drain
/// timeout has passed; the session is closed by then. It stays attached to
/// the connection until the next start or disconnect.
pub async fn handle_stop(state: &Arc<RwLock<ConnectionState>>, relay: &ClientRelay) -> bool {
    let session = state.read().await.running_session();
    match session {
        Some(session) => {
            info!("[{}] Stop requested", session.id());
            session.stop().await;
        }
        None => relay.send_error(WebSocketError::NoActiveSession).await,
    }
    true
}

/// Release the connection's session when the client goes away.
pub async fn handle_disconnect(state: &Arc<RwLock<ConnectionState>>) {
    let session = state.write().await.session.take();
    if let Some(session) = session {
        session.shutdown().await;
    }
}
