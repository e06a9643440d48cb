//! Frame codec for the engine protocol.

use bytes::Bytes;
use prost::Message;
use tracing::debug;

use super::errors::{UpstreamError, UpstreamResult};
use super::events::UpstreamEventKind;
use super::messages::{
    Audio, EventType, ReqParams, RequestMeta, TranslateRequest, TranslateResponse, User,
};
use crate::config::AudioConfig;
use crate::core::language::Language;

/// Builds outbound frames and decodes inbound frames.
///
/// One direction's connection only ever sees frames built for its own
/// upstream session id.
pub trait FrameCodec: Send + Sync {
    /// Session start frame carrying the direction's language pair.
    fn build_start(&self, session_id: &str, source: Language, target: Language) -> Bytes;

    /// Audio frame for one chunk of client audio.
    fn build_audio_chunk(&self, session_id: &str, audio: &[u8]) -> Bytes;

    /// Frame telling the engine no more audio will follow.
    fn build_finish(&self, session_id: &str) -> Bytes;

    /// Decode one inbound frame. A frame may carry zero, one or two events.
    fn parse(&self, frame: &[u8]) -> UpstreamResult<Vec<UpstreamEventKind>>;
}

const USER_ID: &str = "web_translator";
const PLATFORM: &str = "web";
const SDK_VERSION: &str = "1.0.0";
const MODE_SPEECH_TO_SPEECH: &str = "s2s";

/// Protobuf implementation of [`FrameCodec`].
#[derive(Debug, Clone)]
pub struct ProtobufCodec {
    audio: AudioConfig,
}

impl ProtobufCodec {
    pub fn new(audio: AudioConfig) -> Self {
        Self { audio }
    }

    fn request(session_id: &str, event: EventType) -> TranslateRequest {
        TranslateRequest {
            request_meta: Some(RequestMeta {
                session_id: session_id.to_string(),
            }),
            event: event as i32,
            ..Default::default()
        }
    }

    fn encode(request: &TranslateRequest) -> Bytes {
        Bytes::from(request.encode_to_vec())
    }
}

impl FrameCodec for ProtobufCodec {
    fn build_start(&self, session_id: &str, source: Language, target: Language) -> Bytes {
        let mut request = Self::request(session_id, EventType::StartSession);
        request.user = Some(User {
            uid: USER_ID.to_string(),
            did: USER_ID.to_string(),
            platform: PLATFORM.to_string(),
            sdk_version: SDK_VERSION.to_string(),
        });
        request.source_audio = Some(Audio {
            format: self.audio.source_format.clone(),
            rate: self.audio.source_rate as i32,
            bits: self.audio.source_bits as i32,
            channel: self.audio.source_channel as i32,
            binary_data: Bytes::new(),
        });
        request.target_audio = Some(Audio {
            format: self.audio.target_format.clone(),
            rate: self.audio.target_rate as i32,
            ..Default::default()
        });
        request.request = Some(ReqParams {
            mode: MODE_SPEECH_TO_SPEECH.to_string(),
            source_language: source.code().to_string(),
            target_language: target.code().to_string(),
        });
        Self::encode(&request)
    }

    fn build_audio_chunk(&self, session_id: &str, audio: &[u8]) -> Bytes {
        let mut request = Self::request(session_id, EventType::TaskRequest);
        request.source_audio = Some(Audio {
            binary_data: Bytes::copy_from_slice(audio),
            ..Default::default()
        });
        Self::encode(&request)
    }

    fn build_finish(&self, session_id: &str) -> Bytes {
        Self::encode(&Self::request(session_id, EventType::FinishSession))
    }

    fn parse(&self, frame: &[u8]) -> UpstreamResult<Vec<UpstreamEventKind>> {
        let response = TranslateResponse::decode(frame)
            .map_err(|e| UpstreamError::ProtocolDecodeError(e.to_string()))?;

        let Ok(event) = EventType::try_from(response.event) else {
            debug!("Ignoring frame with unknown event {}", response.event);
            return Ok(Vec::new());
        };

        let meta = response.response_meta.unwrap_or_default();
        let text = response.text;
        let mut events = Vec::new();

        match event {
            EventType::SessionStarted => events.push(UpstreamEventKind::SessionStarted),
            EventType::SessionFinished => events.push(UpstreamEventKind::SessionFinished),
            EventType::SessionFailed => {
                let message = if meta.message.is_empty() {
                    format!("Engine session failed (status {})", meta.status_code)
                } else {
                    meta.message
                };
                events.push(UpstreamEventKind::SessionFailed { message });
            }
            EventType::SourceSubtitleStart | EventType::SourceSubtitleResponse => {
                if !text.is_empty() {
                    events.push(UpstreamEventKind::SourceSubtitle {
                        text,
                        is_final: false,
                        sequence: None,
                    });
                }
            }
            EventType::SourceSubtitleEnd => {
                if !text.is_empty() {
                    events.push(UpstreamEventKind::SourceSubtitle {
                        text,
                        is_final: true,
                        sequence: Some(meta.sequence),
                    });
                }
            }
            EventType::TranslationSubtitleStart | EventType::TranslationSubtitleResponse => {
                if !text.is_empty() {
                    events.push(UpstreamEventKind::TranslationSubtitle {
                        text,
                        is_final: false,
                    });
                }
            }
            EventType::TranslationSubtitleEnd => {
                if !text.is_empty() {
                    events.push(UpstreamEventKind::TranslationSubtitle {
                        text,
                        is_final: true,
                    });
                }
            }
            EventType::TtsSentenceStart | EventType::TtsResponse | EventType::TtsSentenceEnd => {
                if !response.data.is_empty() {
                    events.push(UpstreamEventKind::AudioChunk(response.data));
                }
                if event == EventType::TtsSentenceEnd {
                    events.push(UpstreamEventKind::SentenceComplete);
                }
            }
            other => debug!("Ignoring engine event {:?}", other),
        }

        Ok(events)
    }
}
