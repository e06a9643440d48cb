//! Upstream translation engine sessions.
//!
//! Each client session drives two engine sessions, one per direction of the
//! language pair. This module owns the wire codec, the transport and the
//! [`UpstreamSessionPair`] that keeps both connections in lockstep.

pub mod codec;
pub mod errors;
pub mod events;
pub mod messages;
pub mod pair;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use codec::{FrameCodec, ProtobufCodec};
pub use errors::{UpstreamError, UpstreamResult};
pub use events::{UpstreamEvent, UpstreamEventKind};
pub use messages::EventType;
pub use pair::UpstreamSessionPair;
pub use transport::{
    ConnectTarget, EngineSettings, FrameSink, FrameSource, UpstreamConnector, UpstreamLink,
    WebSocketConnector,
};
