//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `sessions` - Recorded sessions and utterances
//! - `ws` - WebSocket interpretation sessions

pub mod api;
pub mod sessions;
pub mod ws;

pub use ws::ws_handler;
