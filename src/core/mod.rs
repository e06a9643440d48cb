pub mod arbiter;
pub mod language;
pub mod session;
pub mod state;
pub mod store;
pub mod upstream;

// Re-export commonly used types for convenience
pub use arbiter::{ArbiterExit, ClientEvent, ClientSink, DirectionArbiter};
pub use language::{Direction, DirectionPair, Language, LanguageError};
pub use session::DualSession;
pub use store::{
    MemoryTurnStore, PersistedUtterance, SessionRecord, SessionTranscript, SqliteTurnStore,
    StoreError, TurnStore,
};
pub use upstream::{
    FrameCodec, ProtobufCodec, UpstreamConnector, UpstreamError, UpstreamSessionPair,
    WebSocketConnector,
};

pub use state::CoreState;
