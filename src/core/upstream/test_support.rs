//! In-process engine double for exercising the session pair.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use prost::Message;
use tokio::sync::{Semaphore, mpsc};

use super::errors::{UpstreamError, UpstreamResult};
use super::messages::{EventType, ResponseMeta, TranslateRequest, TranslateResponse};
use super::transport::{ConnectTarget, FrameSink, FrameSource, UpstreamConnector, UpstreamLink};
use crate::core::language::Direction;

#[derive(Default)]
struct MockState {
    sent: Mutex<Vec<(Direction, Bytes)>>,
    closed: Mutex<Vec<Direction>>,
    inbound: Mutex<HashMap<Direction, mpsc::UnboundedSender<UpstreamResult<Bytes>>>>,
    targets: Mutex<Vec<ConnectTarget>>,
    failing: Mutex<HashSet<Direction>>,
    stalled: Mutex<HashSet<Direction>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    attempts: AtomicUsize,
}

/// Connector whose connections are channels the test controls.
#[derive(Clone, Default)]
pub(crate) struct MockEngine {
    state: Arc<MockState>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make connection attempts for `direction` fail.
    pub fn fail_direction(&self, direction: Direction) {
        self.state.failing.lock().insert(direction);
    }

    /// Make sends on `direction` hang forever.
    pub fn stall_direction(&self, direction: Direction) {
        self.state.stalled.lock().insert(direction);
    }

    /// Hold every connection attempt until [`release_connects`](Self::release_connects).
    pub fn hold_connects(&self) {
        *self.state.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_connects(&self) {
        if let Some(gate) = self.state.gate.lock().take() {
            // Held attempts wake with an error from `acquire` and carry on
            gate.close();
        }
    }

    /// Connection attempts made so far, including held ones.
    pub fn connect_attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// Deliver a frame on `direction`'s inbound stream.
    pub fn push(&self, direction: Direction, frame: Bytes) {
        if let Some(tx) = self.state.inbound.lock().get(&direction) {
            let _ = tx.send(Ok(frame));
        }
    }

    /// Fail `direction`'s inbound stream.
    pub fn push_error(&self, direction: Direction, message: &str) {
        if let Some(tx) = self.state.inbound.lock().get(&direction) {
            let _ = tx.send(Err(UpstreamError::Transport(message.to_string())));
        }
    }

    /// End `direction`'s inbound stream cleanly.
    pub fn end_stream(&self, direction: Direction) {
        self.state.inbound.lock().remove(&direction);
    }

    /// Decoded outbound requests sent on `direction`.
    pub fn requests(&self, direction: Direction) -> Vec<TranslateRequest> {
        self.state
            .sent
            .lock()
            .iter()
            .filter(|(d, _)| *d == direction)
            .map(|(_, frame)| TranslateRequest::decode(frame.as_ref()).unwrap())
            .collect()
    }

    /// Count of outbound requests on `direction` with the given event.
    pub fn count(&self, direction: Direction, event: EventType) -> usize {
        self.requests(direction)
            .iter()
            .filter(|request| request.event == event as i32)
            .count()
    }

    pub fn closed(&self) -> Vec<Direction> {
        self.state.closed.lock().clone()
    }

    pub fn targets(&self) -> Vec<ConnectTarget> {
        self.state.targets.lock().clone()
    }
}

#[async_trait]
impl UpstreamConnector for MockEngine {
    async fn connect(&self, target: &ConnectTarget) -> UpstreamResult<UpstreamLink> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);
        let gate = self.state.gate.lock().clone();
        if let Some(gate) = gate {
            let _ = gate.acquire().await;
        }
        if self.state.failing.lock().contains(&target.direction) {
            return Err(UpstreamError::ConnectionError(
                "engine refused connection".to_string(),
            ));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.inbound.lock().insert(target.direction, tx);
        self.state.targets.lock().push(target.clone());
        let stalled = self.state.stalled.lock().contains(&target.direction);

        Ok(UpstreamLink {
            sink: Box::new(MockSink {
                direction: target.direction,
                state: self.state.clone(),
                stalled,
            }),
            source: Box::new(MockSource { rx }),
        })
    }
}

struct MockSink {
    direction: Direction,
    state: Arc<MockState>,
    stalled: bool,
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send(&mut self, frame: Bytes) -> UpstreamResult<()> {
        let is_start = TranslateRequest::decode(frame.as_ref())
            .map(|request| request.event == EventType::StartSession as i32)
            .unwrap_or(false);
        if self.stalled && !is_start {
            futures::future::pending::<()>().await;
        }
        self.state.sent.lock().push((self.direction, frame));
        Ok(())
    }

    async fn close(&mut self) -> UpstreamResult<()> {
        self.state.closed.lock().push(self.direction);
        Ok(())
    }
}

struct MockSource {
    rx: mpsc::UnboundedReceiver<UpstreamResult<Bytes>>,
}

#[async_trait]
impl FrameSource for MockSource {
    async fn next_frame(&mut self) -> Option<UpstreamResult<Bytes>> {
        self.rx.recv().await
    }
}

/// Encode an engine response frame.
pub(crate) fn response_frame(event: EventType, text: &str, data: &[u8], sequence: i32) -> Bytes {
    let response = TranslateResponse {
        response_meta: Some(ResponseMeta {
            sequence,
            ..Default::default()
        }),
        event: event as i32,
        text: text.to_string(),
        data: Bytes::copy_from_slice(data),
        ..Default::default()
    };
    Bytes::from(response.encode_to_vec())
}
