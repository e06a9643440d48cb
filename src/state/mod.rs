use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::CoreState;
use crate::core::store::{StoreResult, TurnStore};

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Core layer state: engine connector, codec and utterance store
    pub core_state: Arc<CoreState>,
}

impl AppState {
    /// Build the production services from `config`.
    pub fn new(config: ServerConfig) -> StoreResult<Arc<Self>> {
        let core_state = CoreState::new(&config)?;
        Ok(Arc::new(Self { config, core_state }))
    }

    /// Wrap services that were assembled elsewhere.
    pub fn with_core(config: ServerConfig, core_state: CoreState) -> Arc<Self> {
        Arc::new(Self {
            config,
            core_state: Arc::new(core_state),
        })
    }

    /// Get a handle to the application's utterance store
    pub fn store(&self) -> Arc<dyn TurnStore> {
        self.core_state.store.clone()
    }
}
