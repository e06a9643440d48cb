use crate::core::language::Direction;

/// Per-utterance arbitration state.
///
/// The texts are only meaningful while a direction is locked and are
/// cleared together with the lock.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ArbitrationState {
    active: Option<Direction>,
    source_text: String,
    target_text: String,
    sequence: i64,
}

impl ArbitrationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<Direction> {
        self.active
    }

    pub fn is_active(&self, direction: Direction) -> bool {
        self.active == Some(direction)
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    /// Sequence number the next persisted utterance will get.
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Lock `direction` for a new utterance starting with `source_text`.
    pub fn lock(&mut self, direction: Direction, source_text: &str) {
        self.active = Some(direction);
        self.source_text = source_text.to_string();
        self.target_text.clear();
    }

    pub fn set_source_text(&mut self, text: &str) {
        self.source_text = text.to_string();
    }

    pub fn set_target_text(&mut self, text: &str) {
        self.target_text = text.to_string();
    }

    pub fn has_text(&self) -> bool {
        !self.source_text.is_empty() || !self.target_text.is_empty()
    }

    /// Hand out the current sequence number and advance it.
    pub fn take_sequence(&mut self) -> i64 {
        let sequence = self.sequence;
        self.sequence += 1;
        sequence
    }

    /// Drop the lock and the accumulated texts.
    pub fn release(&mut self) {
        self.active = None;
        self.source_text.clear();
        self.target_text.clear();
    }
}
