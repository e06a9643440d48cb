//! Store double for exercising persistence failures.

use async_trait::async_trait;

use super::{NewUtterance, PersistedUtterance, SessionRecord, StoreError, StoreResult, TurnStore};

/// Store whose writes always fail.
pub(crate) struct BrokenStore;

#[async_trait]
impl TurnStore for BrokenStore {
    async fn create_session(
        &self,
        _: &str,
        _: &str,
        _: &str,
        _: Option<&str>,
    ) -> StoreResult<SessionRecord> {
        Err(StoreError::Database("disk full".to_string()))
    }
    async fn add_message(&self, _: NewUtterance) -> StoreResult<PersistedUtterance> {
        Err(StoreError::Database("disk full".to_string()))
    }
    async fn end_session(&self, _: &str) -> StoreResult<()> {
        Err(StoreError::Database("disk full".to_string()))
    }
    async fn get_session(&self, _: &str) -> StoreResult<Option<SessionRecord>> {
        Ok(None)
    }
    async fn list_sessions(&self, _: usize) -> StoreResult<Vec<SessionRecord>> {
        Ok(Vec::new())
    }
    async fn active_session(&self) -> StoreResult<Option<SessionRecord>> {
        Ok(None)
    }
    async fn session_messages(&self, _: &str) -> StoreResult<Vec<PersistedUtterance>> {
        Ok(Vec::new())
    }
    async fn update_title(&self, _: &str, _: &str) -> StoreResult<()> {
        Ok(())
    }
}
