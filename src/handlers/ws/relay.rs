//! Outbound relay from a session to its client socket

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::error::WebSocketError;
use super::messages::OutgoingMessage;
use crate::core::arbiter::{ClientEvent, ClientSink};

/// Forwards client events to the socket's sender task in call order.
///
/// Once the client is gone every send is silently dropped.
#[derive(Clone)]
pub struct ClientRelay {
    tx: mpsc::Sender<OutgoingMessage>,
}

impl ClientRelay {
    pub fn new(tx: mpsc::Sender<OutgoingMessage>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, message: OutgoingMessage) {
        if self.tx.send(message).await.is_err() {
            debug!("Client channel closed, dropping outgoing message");
        }
    }

    pub async fn send_error(&self, error: WebSocketError) {
        self.send(OutgoingMessage::Error {
            message: error.to_message(),
        })
        .await;
    }
}

#[async_trait]
impl ClientSink for ClientRelay {
    async fn deliver(&self, event: ClientEvent) {
        self.send(event.into()).await;
    }
}
