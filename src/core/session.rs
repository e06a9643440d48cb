//! One client's dual-direction interpretation session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::arbiter::{ArbiterExit, ClientEvent, ClientSink, DirectionArbiter};
use crate::core::language::{Direction, DirectionPair};
use crate::core::state::CoreState;
use crate::core::store::TurnStore;
use crate::core::upstream::{UpstreamEvent, UpstreamResult, UpstreamSessionPair};

/// Capacity of the merged event channel between the receive loops and the arbiter.
const EVENT_BUFFER: usize = 256;

/// Marks the stored session ended, at most once.
struct SessionEnd {
    session_id: String,
    store: Arc<dyn TurnStore>,
    ended: AtomicBool,
}

impl SessionEnd {
    async fn mark(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        match self.store.end_session(&self.session_id).await {
            Ok(()) => info!("[{}] Session ended", self.session_id),
            Err(e) => warn!("[{}] Failed to mark session ended: {}", self.session_id, e),
        }
    }
}

/// Upstream pair plus the arbiter task consuming it.
///
/// Owned by exactly one client connection and torn down with it.
pub struct DualSession {
    id: String,
    pair: DirectionPair,
    upstream: Arc<UpstreamSessionPair>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    end: Arc<SessionEnd>,
    drain_timeout: Duration,
}

impl DualSession {
    /// Connect both directions, record the session and start arbitration.
    ///
    /// Nothing is recorded and no task is started when either direction
    /// fails to connect. A session the store refuses to record still runs;
    /// the client is told its utterances will not be saved.
    pub async fn open(
        core: &CoreState,
        pair: DirectionPair,
        sink: Arc<dyn ClientSink>,
    ) -> UpstreamResult<Arc<Self>> {
        let id = Uuid::new_v4().to_string();
        let upstream = Arc::new(UpstreamSessionPair::new(
            pair,
            core.connector.clone(),
            core.codec.clone(),
            core.send_timeout,
        ));
        upstream.connect().await?;

        let recorded = core
            .store
            .create_session(&id, pair.primary().code(), pair.secondary().code(), None)
            .await;
        sink.deliver(ClientEvent::SessionCreated {
            session_id: id.clone(),
        })
        .await;
        if let Err(e) = recorded {
            warn!("[{id}] Failed to record session: {e}");
            sink.deliver(ClientEvent::Error {
                message: format!("Session will not be saved: {e}"),
            })
            .await;
        }

        let end = Arc::new(SessionEnd {
            session_id: id.clone(),
            store: core.store.clone(),
            ended: AtomicBool::new(false),
        });
        let arbiter = DirectionArbiter::new(
            id.clone(),
            pair,
            sink,
            core.store.clone(),
            core.audio_output.clone(),
        );

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        upstream.start_receiving(events_tx);
        let supervisor = tokio::spawn(supervise(
            arbiter,
            events_rx,
            upstream.clone(),
            end.clone(),
        ));

        info!(
            "[{id}] Session started ({} / {})",
            pair.label(Direction::Forward),
            pair.label(Direction::Reverse)
        );
        Ok(Arc::new(Self {
            id,
            pair,
            upstream,
            supervisor: Mutex::new(Some(supervisor)),
            end,
            drain_timeout: core.drain_timeout,
        }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pair(&self) -> DirectionPair {
        self.pair
    }

    /// Whether the session has been marked ended.
    pub fn is_ended(&self) -> bool {
        self.end.ended.load(Ordering::SeqCst)
    }

    /// Fan one chunk of client audio out to both directions.
    pub async fn send_audio(&self, audio: &[u8]) -> bool {
        self.upstream.send_audio(audio).await
    }

    /// Stop sending audio, relay the engine's last results and close.
    ///
    /// Waits for both engine streams to end, at most for the drain timeout,
    /// then closes both directions.
    pub async fn stop(&self) {
        for (direction, e) in self.upstream.finish().await {
            debug!("[{}] Finish failed for {:?}: {}", self.id, direction, e);
        }
        self.end.mark().await;
        if !self.upstream.drain(self.drain_timeout).await {
            debug!(
                "[{}] Engine still open after {:?}, closing",
                self.id, self.drain_timeout
            );
        }
        self.shutdown().await;
    }

    /// Close both directions and wait for all background work to finish.
    pub async fn shutdown(&self) {
        self.upstream.close().await;
        let supervisor = self.supervisor.lock().take();
        if let Some(handle) = supervisor
            && let Err(e) = handle.await
        {
            warn!("[{}] Arbiter task ended abnormally: {}", self.id, e);
        }
        self.end.mark().await;
    }
}

/// Runs the arbiter; a failed direction takes the whole session down.
async fn supervise(
    arbiter: DirectionArbiter,
    events: mpsc::Receiver<UpstreamEvent>,
    upstream: Arc<UpstreamSessionPair>,
    end: Arc<SessionEnd>,
) {
    match arbiter.run(events).await {
        ArbiterExit::Drained => debug!("[{}] Arbiter finished", end.session_id),
        ArbiterExit::DirectionFailed(failure) => {
            warn!(
                "[{}] Tearing down after {:?} failed: {}",
                end.session_id, failure.direction, failure.message
            );
            upstream.close().await;
            end.mark().await;
        }
    }
}
