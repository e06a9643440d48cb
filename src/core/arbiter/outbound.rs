//! Client-facing events produced by arbitration.

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::language::Language;

/// Everything the client can be told about a live session.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    SessionCreated {
        session_id: String,
    },
    Ready,
    Asr {
        text: String,
        is_final: bool,
        sequence: Option<i32>,
    },
    Translation {
        text: String,
        language: Language,
        is_final: bool,
    },
    Audio {
        data: Bytes,
        format: String,
        sample_rate: u32,
    },
    SentenceComplete,
    TurnComplete,
    Error {
        message: String,
    },
}

/// Destination for client events.
///
/// Delivery must preserve call order and must not fail once the client is
/// gone: a closed channel turns delivery into a no-op.
#[async_trait]
pub trait ClientSink: Send + Sync {
    async fn deliver(&self, event: ClientEvent);
}
