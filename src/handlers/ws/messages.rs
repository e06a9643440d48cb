//! WebSocket message types
//!
//! JSON messages exchanged with the client. Field names are camelCase on the
//! wire; every message carries a `type` tag.

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::arbiter::ClientEvent;

/// WebSocket message types for incoming messages
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    /// Open a dual session. Missing languages fall back to the server defaults.
    #[serde(rename = "start", rename_all = "camelCase")]
    Start {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_language: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_language: Option<String>,
    },
    /// One chunk of client audio, base64 encoded
    #[serde(rename = "audio")]
    Audio { data: String },
    #[serde(rename = "stop")]
    Stop,
}

/// WebSocket message types for outgoing messages
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "sessionCreated", rename_all = "camelCase")]
    SessionCreated { session_id: String },
    #[serde(rename = "status")]
    Status { status: String },
    #[serde(rename = "asr", rename_all = "camelCase")]
    Asr {
        text: String,
        is_final: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sequence: Option<i32>,
    },
    #[serde(rename = "translation", rename_all = "camelCase")]
    Translation {
        text: String,
        language: String,
        is_final: bool,
    },
    /// Synthesized speech, base64 encoded
    #[serde(rename = "audio", rename_all = "camelCase")]
    Audio {
        data: String,
        format: String,
        sample_rate: u32,
    },
    #[serde(rename = "sentenceComplete")]
    SentenceComplete,
    #[serde(rename = "turnComplete")]
    TurnComplete,
    #[serde(rename = "error")]
    Error { message: String },
}

pub const STATUS_READY: &str = "ready";

impl From<ClientEvent> for OutgoingMessage {
    fn from(event: ClientEvent) -> Self {
        match event {
            ClientEvent::SessionCreated { session_id } => {
                OutgoingMessage::SessionCreated { session_id }
            }
            ClientEvent::Ready => OutgoingMessage::Status {
                status: STATUS_READY.to_string(),
            },
            ClientEvent::Asr {
                text,
                is_final,
                sequence,
            } => OutgoingMessage::Asr {
                text,
                is_final,
                sequence,
            },
            ClientEvent::Translation {
                text,
                language,
                is_final,
            } => OutgoingMessage::Translation {
                text,
                language: language.code().to_string(),
                is_final,
            },
            ClientEvent::Audio {
                data,
                format,
                sample_rate,
            } => OutgoingMessage::Audio {
                data: BASE64_STANDARD.encode(&data),
                format,
                sample_rate,
            },
            ClientEvent::SentenceComplete => OutgoingMessage::SentenceComplete,
            ClientEvent::TurnComplete => OutgoingMessage::TurnComplete,
            ClientEvent::Error { message } => OutgoingMessage::Error { message },
        }
    }
}
