use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::ServerConfig;
use crate::core::arbiter::AudioOutput;
use crate::core::store::{MemoryTurnStore, SqliteTurnStore, StoreResult, TurnStore};
use crate::core::upstream::{FrameCodec, ProtobufCodec, UpstreamConnector, WebSocketConnector};

/// Core-specific shared state for the application.
///
/// Built once at startup and handed to every session: the engine connector
/// and codec, the utterance store, and the settings sessions are opened with.
#[derive(Clone)]
pub struct CoreState {
    pub store: Arc<dyn TurnStore>,
    pub connector: Arc<dyn UpstreamConnector>,
    pub codec: Arc<dyn FrameCodec>,
    /// Upper bound for a single frame send on one direction
    pub send_timeout: Duration,
    /// How long a stopped session waits for the engine's last results
    pub drain_timeout: Duration,
    pub audio_output: AudioOutput,
}

impl CoreState {
    pub fn new(config: &ServerConfig) -> StoreResult<Arc<Self>> {
        let store: Arc<dyn TurnStore> = match &config.database_path {
            Some(path) => Arc::new(SqliteTurnStore::open(path)?),
            None => {
                info!("No database configured, utterances are kept in memory");
                Arc::new(MemoryTurnStore::new())
            }
        };

        Ok(Arc::new(Self::with_services(
            store,
            Arc::new(WebSocketConnector::new(config.engine_settings())),
            Arc::new(ProtobufCodec::new(config.audio.clone())),
            config.send_timeout(),
            config.drain_timeout(),
            AudioOutput {
                format: client_audio_format(&config.audio.target_format),
                sample_rate: config.audio.target_rate,
            },
        )))
    }

    /// Assemble from explicit services.
    pub fn with_services(
        store: Arc<dyn TurnStore>,
        connector: Arc<dyn UpstreamConnector>,
        codec: Arc<dyn FrameCodec>,
        send_timeout: Duration,
        drain_timeout: Duration,
        audio_output: AudioOutput,
    ) -> Self {
        Self {
            store,
            connector,
            codec,
            send_timeout,
            drain_timeout,
            audio_output,
        }
    }
}

/// Name the client uses for the engine's output audio format (`ogg_opus` is reported as `opus`).
fn client_audio_format(engine_format: &str) -> String {
    engine_format
        .strip_prefix("ogg_")
        .unwrap_or(engine_format)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_audio_format() {
        assert_eq!(client_audio_format("ogg_opus"), "opus");
        assert_eq!(client_audio_format("pcm"), "pcm");
    }
}
