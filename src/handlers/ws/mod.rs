//! # WebSocket Interpretation Handler
//!
//! Client-facing control surface of the relay. Each connection owns at most
//! one dual session: two engine sessions (one per direction) over the same
//! audio, with the arbiter deciding per utterance whose results reach the
//! client.
//!
//! ## Connection Flow
//! 1. Client connects to `/ws`
//! 2. Client sends `start`; the server connects both directions and replies
//!    with `sessionCreated`, then `status: ready` once the engine is up
//! 3. Client streams `audio` messages (or raw binary frames); audio sent with
//!    no running session is dropped
//! 4. Server relays recognition, translation and synthesized audio
//! 5. Client sends `stop`; late results are relayed until the engine closes
//!    or the drain timeout passes, then both directions are closed
//!
//! ## Message Types
//!
//! **Incoming Messages:**
//! - `{"type": "start", "sourceLanguage": "zh", "targetLanguage": "en"}` - both languages optional
//! - `{"type": "audio", "data": "<base64>"}` - one chunk of PCM audio
//! - `{"type": "stop"}`
//! - **Binary messages** - raw audio, same as `audio`
//!
//! **Outgoing Messages:**
//! - `{"type": "sessionCreated", "sessionId": "..."}`
//! - `{"type": "status", "status": "ready"}`
//! - `{"type": "asr", "text": "...", "isFinal": true, "sequence": 3}` - `sequence` only on finals
//! - `{"type": "translation", "text": "...", "language": "en", "isFinal": false}`
//! - `{"type": "audio", "data": "<base64>", "format": "opus", "sampleRate": 24000}`
//! - `{"type": "sentenceComplete"}`
//! - `{"type": "turnComplete"}`
//! - `{"type": "error", "message": "..."}`
//!
//! ## JavaScript Client Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({ type: 'start', sourceLanguage: 'zh', targetLanguage: 'en' }));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   switch (msg.type) {
//!     case 'asr':
//!       console.log('Heard:', msg.text, msg.isFinal);
//!       break;
//!     case 'translation':
//!       console.log('Translated:', msg.text);
//!       break;
//!     case 'error':
//!       console.error(msg.message);
//!       break;
//!   }
//! };
//! ```

mod error;
mod handler;
mod messages;
mod processor;
mod relay;
mod session_handler;
mod state;


pub use error::{WebSocketError, WebSocketResult};
pub use handler::ws_handler;
pub use messages::{IncomingMessage, OutgoingMessage, STATUS_READY};
pub use relay::ClientRelay;
pub use session_handler::resolve_pair;
pub use state::ConnectionState;
