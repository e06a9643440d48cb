//! Durable record of finished utterances.
//!
//! Every completed sentence of a live session is appended as a
//! [`PersistedUtterance`]; sessions themselves are tracked as
//! [`SessionRecord`]s so they can be listed and reviewed later.

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

pub mod memory;
pub mod sqlite;

#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
mod tests;

pub use memory::MemoryTurnStore;
pub use sqlite::SqliteTurnStore;

/// Error types for the utterance store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Storage task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Task(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A client session as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    pub title: String,
    pub source_language: String,
    pub target_language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// One finished utterance of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedUtterance {
    pub id: i64,
    pub session_id: String,
    pub sequence: i64,
    pub source_text: String,
    pub target_text: String,
    pub source_language: String,
    pub target_language: String,
    pub created_at: DateTime<Utc>,
}

/// An utterance about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUtterance {
    pub session_id: String,
    pub sequence: i64,
    pub source_text: String,
    pub target_text: String,
    pub source_language: String,
    pub target_language: String,
}

/// A session together with its utterances. `session` is `None` when there is
/// nothing to show.
#[derive(Debug, Clone, Serialize)]
pub struct SessionTranscript {
    pub session: Option<SessionRecord>,
    pub messages: Vec<PersistedUtterance>,
}

impl SessionTranscript {
    pub fn empty() -> Self {
        Self {
            session: None,
            messages: Vec::new(),
        }
    }
}

/// Title given to sessions created without one.
pub fn default_title(now: DateTime<Local>) -> String {
    format!("Meeting {}", now.format("%Y-%m-%d %H:%M"))
}

/// Storage backend for sessions and their utterances.
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Create an active session. `title` defaults to [`default_title`].
    async fn create_session(
        &self,
        session_id: &str,
        source_language: &str,
        target_language: &str,
        title: Option<&str>,
    ) -> StoreResult<SessionRecord>;

    /// Append an utterance and bump the session's `updated_at`.
    async fn add_message(&self, utterance: NewUtterance) -> StoreResult<PersistedUtterance>;

    /// Mark a session inactive.
    async fn end_session(&self, session_id: &str) -> StoreResult<()>;

    async fn get_session(&self, session_id: &str) -> StoreResult<Option<SessionRecord>>;

    /// Most recently updated sessions first.
    async fn list_sessions(&self, limit: usize) -> StoreResult<Vec<SessionRecord>>;

    /// The most recently updated session that is still active.
    async fn active_session(&self) -> StoreResult<Option<SessionRecord>>;

    /// Utterances of a session in the order they were appended.
    async fn session_messages(&self, session_id: &str) -> StoreResult<Vec<PersistedUtterance>>;

    async fn update_title(&self, session_id: &str, title: &str) -> StoreResult<()>;

    /// A session and its utterances, if the session exists.
    async fn transcript(&self, session_id: &str) -> StoreResult<Option<SessionTranscript>> {
        let Some(session) = self.get_session(session_id).await? else {
            return Ok(None);
        };
        let messages = self.session_messages(session_id).await?;
        Ok(Some(SessionTranscript {
            session: Some(session),
            messages,
        }))
    }
}
