//! The two concurrent engine sessions behind one client session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::codec::FrameCodec;
use super::errors::{UpstreamError, UpstreamResult};
use super::events::{UpstreamEvent, UpstreamEventKind};
use super::transport::{ConnectTarget, FrameSink, FrameSource, UpstreamConnector, UpstreamLink};
use crate::core::language::{Direction, DirectionPair};

/// One direction's live connection.
struct DirectionLink {
    target: ConnectTarget,
    label: String,
    sink: AsyncMutex<Box<dyn FrameSink>>,
    /// Cleared exactly once, when the finish frame is sent
    active: AtomicBool,
}

/// Owns both engine connections of a dual session.
///
/// Audio is fanned out to both directions, inbound frames from both are
/// decoded and merged into a single event channel tagged with their origin.
pub struct UpstreamSessionPair {
    pair: DirectionPair,
    connector: Arc<dyn UpstreamConnector>,
    codec: Arc<dyn FrameCodec>,
    send_timeout: Duration,
    links: RwLock<[Option<Arc<DirectionLink>>; 2]>,
    sources: Mutex<Vec<(Arc<DirectionLink>, Box<dyn FrameSource>)>>,
    receivers: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
    connecting: AtomicBool,
    closed: AtomicBool,
}

impl UpstreamSessionPair {
    pub fn new(
        pair: DirectionPair,
        connector: Arc<dyn UpstreamConnector>,
        codec: Arc<dyn FrameCodec>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            pair,
            connector,
            codec,
            send_timeout,
            links: RwLock::new([None, None]),
            sources: Mutex::new(Vec::new()),
            receivers: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            connecting: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn pair(&self) -> DirectionPair {
        self.pair
    }

    /// Whether `direction` is connected and has not been finished.
    pub fn is_active(&self, direction: Direction) -> bool {
        self.links.read()[direction.index()]
            .as_ref()
            .is_some_and(|link| link.active.load(Ordering::SeqCst))
    }

    /// Engine session id of `direction`, once connected.
    pub fn session_id(&self, direction: Direction) -> Option<String> {
        self.links.read()[direction.index()]
            .as_ref()
            .map(|link| link.target.session_id.clone())
    }

    /// Connect both directions and send their start frames.
    ///
    /// Either both directions come up or neither does: a surviving
    /// connection is closed when its sibling fails.
    pub async fn connect(&self) -> UpstreamResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(UpstreamError::Closed);
        }
        if self.connecting.swap(true, Ordering::SeqCst) {
            return Err(UpstreamError::ConnectionError(
                "Session pair already connected".to_string(),
            ));
        }

        let (forward, reverse) = tokio::join!(
            self.open(Direction::Forward),
            self.open(Direction::Reverse)
        );

        let (forward, reverse) = match (forward, reverse) {
            (Ok(forward), Ok(reverse)) => (forward, reverse),
            (forward, reverse) => {
                let mut failures = Vec::new();
                for result in [forward, reverse] {
                    match result {
                        Ok((link, _source)) => {
                            warn!("[{}] Closing connection, sibling failed", link.label);
                            let mut sink = link.sink.into_inner();
                            if let Err(e) = sink.close().await {
                                debug!("[{}] Close failed: {}", link.label, e);
                            }
                        }
                        Err(e) => failures.push(e.to_string()),
                    }
                }
                return Err(UpstreamError::ConnectionError(failures.join("; ")));
            }
        };

        {
            let mut links = self.links.write();
            let mut sources = self.sources.lock();
            for (link, source) in [forward, reverse] {
                let link = Arc::new(link);
                links[link.target.direction.index()] = Some(link.clone());
                sources.push((link, source));
            }
        }

        // close() may have run while we were connecting
        if self.closed.load(Ordering::SeqCst) {
            self.sources.lock().clear();
            for (direction, e) in self.finish().await {
                debug!("Finish after late connect failed for {:?}: {}", direction, e);
            }
            self.close_links(self.take_links()).await;
            return Err(UpstreamError::Closed);
        }

        info!(
            "Upstream sessions started: {} and {}",
            self.pair.label(Direction::Forward),
            self.pair.label(Direction::Reverse)
        );
        Ok(())
    }

    async fn open(
        &self,
        direction: Direction,
    ) -> UpstreamResult<(DirectionLink, Box<dyn FrameSource>)> {
        let label = self.pair.label(direction);
        let target = ConnectTarget {
            direction,
            session_id: Uuid::new_v4().to_string(),
            connect_id: Uuid::new_v4().to_string(),
        };

        let UpstreamLink { mut sink, source } =
            self.connector.connect(&target).await.map_err(|e| {
                error!("[{label}] Failed to connect: {e}");
                UpstreamError::ConnectionError(format!("{label}: {e}"))
            })?;

        let (source_language, target_language) = self.pair.languages(direction);
        let start = self
            .codec
            .build_start(&target.session_id, source_language, target_language);
        let sent = match timeout(self.send_timeout, sink.send(start)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::SendTimeout(self.send_timeout)),
        };
        if let Err(e) = sent {
            let _ = sink.close().await;
            return Err(UpstreamError::ConnectionError(format!(
                "{label}: failed to start session: {e}"
            )));
        }

        debug!("[{label}] Start frame sent for session {}", target.session_id);
        Ok((
            DirectionLink {
                target,
                label,
                sink: AsyncMutex::new(sink),
                active: AtomicBool::new(true),
            },
            source,
        ))
    }

    /// Spawn one receive loop per direction feeding `events`.
    ///
    /// The loops stop when the engine ends the stream, when the consumer
    /// drops the channel, or when the pair is closed.
    pub fn start_receiving(&self, events: mpsc::Sender<UpstreamEvent>) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let sources = std::mem::take(&mut *self.sources.lock());
        let handles: Vec<JoinHandle<()>> = sources
            .into_iter()
            .map(|(link, source)| {
                tokio::spawn(receive_loop(
                    link,
                    source,
                    self.codec.clone(),
                    events.clone(),
                    self.cancel.clone(),
                ))
            })
            .collect();
        self.receivers.lock().extend(handles);
    }

    fn active_links(&self) -> Vec<Arc<DirectionLink>> {
        self.links
            .read()
            .iter()
            .flatten()
            .filter(|link| link.active.load(Ordering::SeqCst))
            .cloned()
            .collect()
    }

    async fn send_frame(&self, link: &DirectionLink, frame: Bytes) -> UpstreamResult<()> {
        let send = async { link.sink.lock().await.send(frame).await };
        match timeout(self.send_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::SendTimeout(self.send_timeout)),
        }
    }

    /// Forward one chunk of client audio to every active direction.
    ///
    /// Returns `false` when no direction is active. A slow or failed
    /// direction never holds back the other one.
    pub async fn send_audio(&self, audio: &[u8]) -> bool {
        let links = self.active_links();
        if links.is_empty() {
            return false;
        }

        let sends = links.iter().map(|link| {
            let frame = self
                .codec
                .build_audio_chunk(&link.target.session_id, audio);
            self.send_frame(link, frame)
        });
        let results = join_all(sends).await;

        for (link, result) in links.iter().zip(results) {
            if let Err(e) = result {
                warn!("[{}] Failed to send audio: {}", link.label, e);
            }
        }
        true
    }

    /// Send the finish frame to each direction that has not been finished yet.
    pub async fn finish(&self) -> Vec<(Direction, UpstreamError)> {
        let mut pending = Vec::new();
        for link in self.links.read().iter().flatten() {
            if link.active.swap(false, Ordering::SeqCst) {
                pending.push(link.clone());
            }
        }

        let sends = pending.iter().map(|link| {
            let frame = self.codec.build_finish(&link.target.session_id);
            self.send_frame(link, frame)
        });
        let results = join_all(sends).await;

        let mut errors = Vec::new();
        for (link, result) in pending.iter().zip(results) {
            match result {
                Ok(()) => info!("[{}] Finish frame sent", link.label),
                Err(e) => {
                    warn!("[{}] Failed to send finish frame: {}", link.label, e);
                    errors.push((link.target.direction, e));
                }
            }
        }
        errors
    }

    /// Wait up to `wait` for both receive loops to end on their own.
    ///
    /// Returns `false` on timeout; the loops left running are still awaited
    /// by [`close`](Self::close).
    pub async fn drain(&self, wait: Duration) -> bool {
        let mut handles: Vec<JoinHandle<()>> = self.receivers.lock().drain(..).collect();
        let drained = timeout(wait, join_all(handles.iter_mut())).await.is_ok();
        if !drained {
            // A completed handle must not be polled again
            self.receivers
                .lock()
                .extend(handles.into_iter().filter(|handle| !handle.is_finished()));
        }
        drained
    }

    /// Stop both receive loops, finish and close both connections.
    ///
    /// Safe to call more than once. Errors are logged, not returned.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();
        self.sources.lock().clear();

        let handles: Vec<JoinHandle<()>> = self.receivers.lock().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Receive loop ended abnormally: {}", e);
            }
        }

        for (direction, e) in self.finish().await {
            debug!("Finish on close failed for {:?}: {}", direction, e);
        }
        self.close_links(self.take_links()).await;
        info!("Upstream session pair closed");
    }

    fn take_links(&self) -> Vec<Arc<DirectionLink>> {
        self.links
            .write()
            .iter_mut()
            .filter_map(Option::take)
            .collect()
    }

    async fn close_links(&self, links: Vec<Arc<DirectionLink>>) {
        for link in links {
            link.active.store(false, Ordering::SeqCst);
            let close = async { link.sink.lock().await.close().await };
            match timeout(self.send_timeout, close).await {
                Ok(Ok(())) => debug!("[{}] Connection closed", link.label),
                Ok(Err(e)) => debug!("[{}] Close failed: {}", link.label, e),
                Err(_) => debug!("[{}] Close timed out", link.label),
            }
        }
    }
}

/// Deliver an event unless the pair is being torn down.
async fn forward(
    events: &mpsc::Sender<UpstreamEvent>,
    cancel: &CancellationToken,
    event: UpstreamEvent,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = events.send(event) => sent.is_ok(),
    }
}

/// Reads one direction until it ends. An end of stream before the direction
/// was finished counts as a failure of that direction.
async fn receive_loop(
    link: Arc<DirectionLink>,
    mut source: Box<dyn FrameSource>,
    codec: Arc<dyn FrameCodec>,
    events: mpsc::Sender<UpstreamEvent>,
    cancel: CancellationToken,
) {
    let direction = link.target.direction;
    let label = link.label.clone();
    debug!("[{label}] Receive loop started");
    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            frame = source.next_frame() => frame,
        };

        match frame {
            Some(Ok(bytes)) => {
                let kinds = match codec.parse(&bytes) {
                    Ok(kinds) => kinds,
                    Err(e) => {
                        warn!("[{label}] Dropping frame: {e}");
                        continue;
                    }
                };
                for kind in kinds {
                    if !forward(&events, &cancel, UpstreamEvent::new(direction, kind)).await {
                        debug!("[{label}] Event consumer gone, stopping");
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                error!("[{label}] Engine connection failed: {e}");
                let failure = UpstreamEventKind::SessionFailed {
                    message: format!("Engine connection lost ({label}): {e}"),
                };
                forward(&events, &cancel, UpstreamEvent::new(direction, failure)).await;
                break;
            }
            None if link.active.load(Ordering::SeqCst) => {
                warn!("[{label}] Engine closed the stream before the session finished");
                let failure = UpstreamEventKind::SessionFailed {
                    message: format!("Engine closed the {label} session unexpectedly"),
                };
                forward(&events, &cancel, UpstreamEvent::new(direction, failure)).await;
                break;
            }
            None => {
                info!("[{label}] Engine stream ended");
                break;
            }
        }
    }
    debug!("[{label}] Receive loop stopped");
}
