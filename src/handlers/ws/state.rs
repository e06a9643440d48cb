//! WebSocket connection state management

use std::sync::Arc;

use crate::core::session::DualSession;

/// Per-connection state
///
/// A connection owns at most one dual session at a time.
#[derive(Default)]
pub struct ConnectionState {
    pub session: Option<Arc<DualSession>>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current session, if it has not been stopped.
    pub fn running_session(&self) -> Option<Arc<DualSession>> {
        self.session
            .as_ref()
            .filter(|session| !session.is_ended())
            .cloned()
    }
}
