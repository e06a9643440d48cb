use async_trait::async_trait;
use chrono::{Local, Utc};
use parking_lot::RwLock;

use super::{
    NewUtterance, PersistedUtterance, SessionRecord, StoreError, StoreResult, TurnStore,
    default_title,
};

#[derive(Default)]
struct Inner {
    sessions: Vec<SessionRecord>,
    messages: Vec<PersistedUtterance>,
    next_id: i64,
}

/// Process-local store used when no database is configured.
#[derive(Default)]
pub struct MemoryTurnStore {
    inner: RwLock<Inner>,
}

impl MemoryTurnStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first. Callers pass sessions newest-inserted first so ties keep that order.
fn by_recency(sessions: &mut [SessionRecord]) {
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

#[async_trait]
impl TurnStore for MemoryTurnStore {
    async fn create_session(
        &self,
        session_id: &str,
        source_language: &str,
        target_language: &str,
        title: Option<&str>,
    ) -> StoreResult<SessionRecord> {
        let mut inner = self.inner.write();
        if inner.sessions.iter().any(|s| s.session_id == session_id) {
            return Err(StoreError::Database(format!(
                "Session {session_id} already exists"
            )));
        }
        let now = Utc::now();
        let record = SessionRecord {
            session_id: session_id.to_string(),
            title: title
                .map(str::to_string)
                .unwrap_or_else(|| default_title(Local::now())),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            created_at: now,
            updated_at: now,
            is_active: true,
        };
        inner.sessions.push(record.clone());
        Ok(record)
    }

    async fn add_message(&self, utterance: NewUtterance) -> StoreResult<PersistedUtterance> {
        let mut inner = self.inner.write();
        let now = Utc::now();
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.session_id == utterance.session_id)
            .ok_or_else(|| StoreError::NotFound(utterance.session_id.clone()))?;
        session.updated_at = now;

        inner.next_id += 1;
        let message = PersistedUtterance {
            id: inner.next_id,
            session_id: utterance.session_id,
            sequence: utterance.sequence,
            source_text: utterance.source_text,
            target_text: utterance.target_text,
            source_language: utterance.source_language,
            target_language: utterance.target_language,
            created_at: now,
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn end_session(&self, session_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;
        session.is_active = false;
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> StoreResult<Option<SessionRecord>> {
        Ok(self
            .inner
            .read()
            .sessions
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned())
    }

    async fn list_sessions(&self, limit: usize) -> StoreResult<Vec<SessionRecord>> {
        let mut sessions: Vec<SessionRecord> =
            self.inner.read().sessions.iter().rev().cloned().collect();
        by_recency(&mut sessions);
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn active_session(&self) -> StoreResult<Option<SessionRecord>> {
        let mut sessions: Vec<SessionRecord> = self
            .inner
            .read()
            .sessions
            .iter()
            .rev()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        by_recency(&mut sessions);
        Ok(sessions.into_iter().next())
    }

    async fn session_messages(&self, session_id: &str) -> StoreResult<Vec<PersistedUtterance>> {
        Ok(self
            .inner
            .read()
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn update_title(&self, session_id: &str, title: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;
        session.title = title.to_string();
        session.updated_at = Utc::now();
        Ok(())
    }
}
