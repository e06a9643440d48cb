//! Error types for upstream engine connections

use std::time::Duration;

/// Error types for the upstream session pair and its transports
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// Handshake with the engine failed, or only one direction came up
    #[error("Connection failed: {0}")]
    ConnectionError(String),
    /// An inbound frame could not be decoded
    #[error("Failed to decode engine frame: {0}")]
    ProtocolDecodeError(String),
    /// The transport failed after the connection was established
    #[error("Transport error: {0}")]
    Transport(String),
    /// A send did not complete in time
    #[error("Send timed out after {0:?}")]
    SendTimeout(Duration),
    /// The pair has been closed
    #[error("Upstream session is closed")]
    Closed,
}

/// Result type for upstream operations
pub type UpstreamResult<T> = Result<T, UpstreamError>;
