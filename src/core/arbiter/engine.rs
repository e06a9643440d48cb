//! Event handling for one dual session.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::outbound::{ClientEvent, ClientSink};
use super::state::ArbitrationState;
use crate::core::language::{Direction, DirectionPair, meaningful};
use crate::core::store::{NewUtterance, TurnStore};
use crate::core::upstream::{UpstreamEvent, UpstreamEventKind};

/// Format and rate reported with synthesized audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioOutput {
    pub format: String,
    pub sample_rate: u32,
}

/// A direction reported a session-level failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionFailure {
    pub direction: Direction,
    pub message: String,
}

/// Why [`DirectionArbiter::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbiterExit {
    /// Every event producer is gone.
    Drained,
    DirectionFailed(DirectionFailure),
}

/// Single consumer of both directions' events.
///
/// Owns the [`ArbitrationState`] outright, so the two receive paths never
/// touch it directly: they only feed the merged channel.
pub struct DirectionArbiter {
    session_id: String,
    pair: DirectionPair,
    state: ArbitrationState,
    sink: Arc<dyn ClientSink>,
    store: Arc<dyn TurnStore>,
    audio: AudioOutput,
    ready_sent: bool,
    finished_seen: bool,
}

impl DirectionArbiter {
    pub fn new(
        session_id: String,
        pair: DirectionPair,
        sink: Arc<dyn ClientSink>,
        store: Arc<dyn TurnStore>,
        audio: AudioOutput,
    ) -> Self {
        Self {
            session_id,
            pair,
            state: ArbitrationState::new(),
            sink,
            store,
            audio,
            ready_sent: false,
            finished_seen: false,
        }
    }

    pub fn state(&self) -> &ArbitrationState {
        &self.state
    }

    /// Consume events until the channel closes or a direction fails.
    pub async fn run(mut self, mut events: mpsc::Receiver<UpstreamEvent>) -> ArbiterExit {
        while let Some(event) = events.recv().await {
            if let Some(failure) = self.handle(event).await {
                return ArbiterExit::DirectionFailed(failure);
            }
        }
        debug!("[{}] Event stream drained", self.session_id);
        ArbiterExit::Drained
    }

    /// Apply one event. Returns the failure when the event was a session failure.
    pub async fn handle(&mut self, event: UpstreamEvent) -> Option<DirectionFailure> {
        let origin = event.origin;
        debug!(
            "[{}] {} from {}",
            self.session_id,
            event.name(),
            self.pair.label(origin)
        );
        match event.kind {
            UpstreamEventKind::SourceSubtitle {
                text,
                is_final,
                sequence,
            } => self.on_source_subtitle(origin, text, is_final, sequence).await,
            UpstreamEventKind::TranslationSubtitle { text, is_final } => {
                self.on_translation(origin, text, is_final).await
            }
            UpstreamEventKind::AudioChunk(data) => self.on_audio(origin, data).await,
            UpstreamEventKind::SentenceComplete => self.on_sentence_complete(origin).await,
            UpstreamEventKind::TurnComplete => self.on_turn_complete(origin).await,
            UpstreamEventKind::SessionStarted => {
                if !self.ready_sent {
                    self.ready_sent = true;
                    info!(
                        "[{}] Ready, first reported by {}",
                        self.session_id,
                        self.pair.label(origin)
                    );
                    self.sink.deliver(ClientEvent::Ready).await;
                }
            }
            UpstreamEventKind::SessionFinished => {
                // Whichever direction finishes first closes the turn; the second is redundant
                if !self.finished_seen {
                    self.finished_seen = true;
                    self.on_turn_complete(origin).await;
                } else {
                    debug!("[{}] {} finished", self.session_id, self.pair.label(origin));
                }
            }
            UpstreamEventKind::SessionFailed { message } => {
                error!(
                    "[{}] {} failed: {}",
                    self.session_id,
                    self.pair.label(origin),
                    message
                );
                self.sink
                    .deliver(ClientEvent::Error {
                        message: message.clone(),
                    })
                    .await;
                return Some(DirectionFailure {
                    direction: origin,
                    message,
                });
            }
        }
        None
    }

    async fn on_source_subtitle(
        &mut self,
        origin: Direction,
        text: String,
        is_final: bool,
        sequence: Option<i32>,
    ) {
        if !meaningful(&text) {
            return;
        }

        let expected = self.pair.expected_direction(&text);
        if self.pair.source(origin) != self.pair.detect_language(&text) {
            debug!(
                "[{}] {} heard the other language, dropping {:?}",
                self.session_id,
                self.pair.label(origin),
                text
            );
            return;
        }

        let accepted = if is_final {
            match self.state.active() {
                None => {
                    self.state.lock(expected, &text);
                    info!(
                        "[{}] Locked to {}",
                        self.session_id,
                        self.pair.label(expected)
                    );
                    true
                }
                Some(active) if active == origin => {
                    self.state.set_source_text(&text);
                    true
                }
                Some(_) => false,
            }
        } else {
            match self.state.active() {
                Some(active) => active == origin,
                None => origin == expected,
            }
        };

        if !accepted {
            debug!(
                "[{}] Suppressed recognition from {}",
                self.session_id,
                self.pair.label(origin)
            );
            return;
        }

        self.sink
            .deliver(ClientEvent::Asr {
                text,
                is_final,
                sequence: if is_final { sequence } else { None },
            })
            .await;
    }

    async fn on_translation(&mut self, origin: Direction, text: String, is_final: bool) {
        if !self.state.is_active(origin) {
            debug!(
                "[{}] Suppressed translation from {}",
                self.session_id,
                self.pair.label(origin)
            );
            return;
        }
        if is_final {
            self.state.set_target_text(&text);
        }
        self.sink
            .deliver(ClientEvent::Translation {
                text,
                language: self.pair.target(origin),
                is_final,
            })
            .await;
    }

    async fn on_audio(&mut self, origin: Direction, data: Bytes) {
        if !self.state.is_active(origin) {
            return;
        }
        self.sink
            .deliver(ClientEvent::Audio {
                data,
                format: self.audio.format.clone(),
                sample_rate: self.audio.sample_rate,
            })
            .await;
    }

    async fn on_sentence_complete(&mut self, origin: Direction) {
        if !self.state.is_active(origin) {
            debug!(
                "[{}] Ignoring sentence end from {}",
                self.session_id,
                self.pair.label(origin)
            );
            return;
        }

        if self.state.has_text() {
            self.persist(origin).await;
        }
        self.sink.deliver(ClientEvent::SentenceComplete).await;
        self.state.release();
    }

    async fn persist(&mut self, direction: Direction) {
        let (source_language, target_language) = self.pair.languages(direction);
        let utterance = NewUtterance {
            session_id: self.session_id.clone(),
            sequence: self.state.take_sequence(),
            source_text: self.state.source_text().to_string(),
            target_text: self.state.target_text().to_string(),
            source_language: source_language.code().to_string(),
            target_language: target_language.code().to_string(),
        };
        let sequence = utterance.sequence;

        match self.store.add_message(utterance).await {
            Ok(_) => info!("[{}] Saved utterance #{}", self.session_id, sequence),
            Err(e) => warn!(
                "[{}] Failed to save utterance #{}: {}",
                self.session_id, sequence, e
            ),
        }
    }

    async fn on_turn_complete(&mut self, origin: Direction) {
        debug!(
            "[{}] Turn boundary from {}",
            self.session_id,
            self.pair.label(origin)
        );
        self.sink.deliver(ClientEvent::TurnComplete).await;
        self.state.release();
    }
}
