//! Typed events decoded from the engine's response frames.

use bytes::Bytes;

use crate::core::language::Direction;

/// What an engine frame reported, independent of which direction sent it.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamEventKind {
    SessionStarted,
    SessionFailed {
        message: String,
    },
    SessionFinished,
    /// Speech recognition of the direction's source language
    SourceSubtitle {
        text: String,
        is_final: bool,
        sequence: Option<i32>,
    },
    /// Machine translation into the direction's target language
    TranslationSubtitle {
        text: String,
        is_final: bool,
    },
    /// Synthesized speech of the translation
    AudioChunk(Bytes),
    SentenceComplete,
    /// Session-level turn boundary.
    ///
    /// [`ProtobufCodec`](super::ProtobufCodec) never produces it: that engine
    /// ends a turn with `SessionFinished`, which the arbiter reports to the
    /// client as a turn boundary. Codecs for engines with an explicit turn
    /// event map it here.
    TurnComplete,
}

/// An event tagged with the direction whose connection produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamEvent {
    pub origin: Direction,
    pub kind: UpstreamEventKind,
}

impl UpstreamEvent {
    pub fn new(origin: Direction, kind: UpstreamEventKind) -> Self {
        Self { origin, kind }
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self.kind {
            UpstreamEventKind::SessionStarted => "session_started",
            UpstreamEventKind::SessionFailed { .. } => "session_failed",
            UpstreamEventKind::SessionFinished => "session_finished",
            UpstreamEventKind::SourceSubtitle { .. } => "source_subtitle",
            UpstreamEventKind::TranslationSubtitle { .. } => "translation_subtitle",
            UpstreamEventKind::AudioChunk(_) => "audio_chunk",
            UpstreamEventKind::SentenceComplete => "sentence_complete",
            UpstreamEventKind::TurnComplete => "turn_complete",
        }
    }
}
