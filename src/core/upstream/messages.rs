//! Protobuf schema of the translation engine's binary frames.
//!
//! Every frame on the engine socket is one encoded `TranslateRequest` (client
//! to engine) or `TranslateResponse` (engine to client). The `event` field
//! selects the meaning of the remaining fields.

use prost::bytes::Bytes;

/// Event numbers carried in the `event` field of both frame types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EventType {
    None = 0,

    // Client to engine
    StartSession = 100,
    FinishSession = 102,
    TaskRequest = 200,

    // Session lifecycle
    SessionStarted = 150,
    SessionFinished = 152,
    SessionFailed = 153,
    UsageResponse = 154,

    AudioMuted = 250,

    // Synthesized speech
    TtsSentenceStart = 350,
    TtsSentenceEnd = 351,
    TtsResponse = 352,

    // Recognition of the source language
    SourceSubtitleStart = 650,
    SourceSubtitleResponse = 651,
    SourceSubtitleEnd = 652,

    // Translation into the target language
    TranslationSubtitleStart = 653,
    TranslationSubtitleResponse = 654,
    TranslationSubtitleEnd = 655,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RequestMeta {
    #[prost(string, tag = "1")]
    pub session_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    #[prost(string, tag = "1")]
    pub uid: String,
    #[prost(string, tag = "2")]
    pub did: String,
    #[prost(string, tag = "3")]
    pub platform: String,
    #[prost(string, tag = "4")]
    pub sdk_version: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Audio {
    #[prost(string, tag = "1")]
    pub format: String,
    #[prost(int32, tag = "2")]
    pub rate: i32,
    #[prost(int32, tag = "3")]
    pub bits: i32,
    #[prost(int32, tag = "4")]
    pub channel: i32,
    #[prost(bytes = "bytes", tag = "5")]
    pub binary_data: Bytes,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReqParams {
    #[prost(string, tag = "1")]
    pub mode: String,
    #[prost(string, tag = "2")]
    pub source_language: String,
    #[prost(string, tag = "3")]
    pub target_language: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TranslateRequest {
    #[prost(message, optional, tag = "1")]
    pub request_meta: Option<RequestMeta>,
    #[prost(enumeration = "EventType", tag = "2")]
    pub event: i32,
    #[prost(message, optional, tag = "3")]
    pub user: Option<User>,
    #[prost(message, optional, tag = "4")]
    pub source_audio: Option<Audio>,
    #[prost(message, optional, tag = "5")]
    pub target_audio: Option<Audio>,
    #[prost(message, optional, tag = "6")]
    pub request: Option<ReqParams>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResponseMeta {
    #[prost(string, tag = "1")]
    pub session_id: String,
    #[prost(int32, tag = "2")]
    pub sequence: i32,
    #[prost(int32, tag = "3")]
    pub status_code: i32,
    #[prost(string, tag = "4")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TranslateResponse {
    #[prost(message, optional, tag = "1")]
    pub response_meta: Option<ResponseMeta>,
    #[prost(enumeration = "EventType", tag = "2")]
    pub event: i32,
    #[prost(string, tag = "3")]
    pub text: String,
    #[prost(bytes = "bytes", tag = "4")]
    pub data: Bytes,
    #[prost(int32, tag = "5")]
    pub start_time: i32,
    #[prost(int32, tag = "6")]
    pub end_time: i32,
}
