//! Transport seam between the session pair and the engine.
//!
//! The pair only talks to [`UpstreamConnector`], [`FrameSink`] and
//! [`FrameSource`], so tests can drive it without a network.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use super::errors::{UpstreamError, UpstreamResult};
use crate::core::language::Direction;

/// Identity of one upstream connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub direction: Direction,
    /// Engine session id sent in every frame of this connection
    pub session_id: String,
    /// Per-connection id sent in the handshake
    pub connect_id: String,
}

/// Outbound half of an engine connection.
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: Bytes) -> UpstreamResult<()>;
    async fn close(&mut self) -> UpstreamResult<()>;
}

/// Inbound half of an engine connection.
#[async_trait]
pub trait FrameSource: Send {
    /// Next binary frame, or `None` once the engine closed the stream.
    async fn next_frame(&mut self) -> Option<UpstreamResult<Bytes>>;
}

/// An established connection split into its two halves.
pub struct UpstreamLink {
    pub sink: Box<dyn FrameSink>,
    pub source: Box<dyn FrameSource>,
}

/// Opens engine connections.
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    async fn connect(&self, target: &ConnectTarget) -> UpstreamResult<UpstreamLink>;
}

/// Engine endpoint and credentials.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub url: String,
    pub app_key: String,
    pub access_key: String,
    pub resource_id: String,
    pub connect_timeout: Duration,
}

/// [`UpstreamConnector`] over tokio-tungstenite.
pub struct WebSocketConnector {
    settings: EngineSettings,
}

impl WebSocketConnector {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }
}

fn header(value: &str) -> UpstreamResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| UpstreamError::ConnectionError(format!("Invalid header value: {e}")))
}

#[async_trait]
impl UpstreamConnector for WebSocketConnector {
    async fn connect(&self, target: &ConnectTarget) -> UpstreamResult<UpstreamLink> {
        let mut request = self
            .settings
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| UpstreamError::ConnectionError(format!("Invalid engine URL: {e}")))?;

        let headers = request.headers_mut();
        headers.insert("x-api-app-key", header(&self.settings.app_key)?);
        headers.insert("x-api-access-key", header(&self.settings.access_key)?);
        headers.insert("x-api-resource-id", header(&self.settings.resource_id)?);
        headers.insert("x-api-connect-id", header(&target.connect_id)?);

        let (stream, _response) = timeout(self.settings.connect_timeout, connect_async(request))
            .await
            .map_err(|_| {
                UpstreamError::ConnectionError(format!(
                    "Timed out after {:?} connecting to engine",
                    self.settings.connect_timeout
                ))
            })?
            .map_err(|e| UpstreamError::ConnectionError(e.to_string()))?;

        info!(
            "Connected to engine for {:?} (connect id {})",
            target.direction, target.connect_id
        );

        let (sink, source) = stream.split();
        Ok(UpstreamLink {
            sink: Box::new(WsFrameSink { sink }),
            source: Box::new(WsFrameSource { source }),
        })
    }
}

type EngineStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct WsFrameSink {
    sink: SplitSink<EngineStream, Message>,
}

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn send(&mut self, frame: Bytes) -> UpstreamResult<()> {
        self.sink
            .send(Message::Binary(frame))
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> UpstreamResult<()> {
        self.sink
            .close()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))
    }
}

struct WsFrameSource {
    source: SplitStream<EngineStream>,
}

#[async_trait]
impl FrameSource for WsFrameSource {
    async fn next_frame(&mut self) -> Option<UpstreamResult<Bytes>> {
        loop {
            match self.source.next().await? {
                Ok(Message::Binary(data)) => return Some(Ok(data)),
                Ok(Message::Close(frame)) => {
                    debug!("Engine closed connection: {:?}", frame);
                    return None;
                }
                Ok(Message::Text(text)) => {
                    debug!("Ignoring text frame from engine: {}", text.as_str());
                }
                Ok(_) => {}
                Err(e) => return Some(Err(UpstreamError::Transport(e.to_string()))),
            }
        }
    }
}
