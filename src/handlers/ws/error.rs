//! WebSocket error types and handling

use thiserror::Error;

/// WebSocket handler error types
#[derive(Debug, Error)]
pub enum WebSocketError {
    /// A start was requested while a session is running
    #[error("Session already started. Send stop first.")]
    SessionAlreadyStarted,

    /// Audio or stop arrived before a session was started
    #[error("No active session. Send start first.")]
    NoActiveSession,

    /// The requested languages cannot be arbitrated
    #[error("Invalid language pair: {0}")]
    InvalidLanguagePair(String),

    /// The engine could not be reached for both directions
    #[error("Failed to connect to translation engine: {0}")]
    Connection(String),

    /// Audio payload was not valid base64
    #[error("Invalid audio data: {0}")]
    InvalidAudio(String),

    /// Invalid message format
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),
}

impl WebSocketError {
    /// Convert error to outgoing message format
    pub fn to_message(&self) -> String {
        self.to_string()
    }
}

/// Result type for WebSocket operations
pub type WebSocketResult<T> = Result<T, WebSocketError>;
