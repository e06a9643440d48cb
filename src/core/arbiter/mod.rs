//! Direction arbitration.
//!
//! Both directions of a dual session hear the same audio, so both produce
//! results for every utterance. The arbiter decides per utterance which
//! direction is authoritative: the first valid final recognition locks a
//! direction, everything from the other direction is suppressed until the
//! sentence or turn ends, and finished sentences are persisted.

pub mod engine;
pub mod outbound;
pub mod state;


pub use engine::{ArbiterExit, AudioOutput, DirectionArbiter, DirectionFailure};
pub use outbound::{ClientEvent, ClientSink};
pub use state::ArbitrationState;
