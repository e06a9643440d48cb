use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use base64::prelude::*;
use bytes::Bytes;
use futures::{SinkExt, Stream, StreamExt};
use parking_lot::Mutex;
use prost::Message as _;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::{accept_hdr_async, connect_async, tungstenite::protocol::Message};

use bitran::config::AudioConfig;
use bitran::core::upstream::messages::{
    EventType, ResponseMeta, TranslateRequest, TranslateResponse,
};
use bitran::{ServerConfig, routes, state::AppState};

/// Headers seen by the fake engine, one entry per connection.
type SeenKeys = Arc<Mutex<Vec<String>>>;

fn frame(event: EventType, text: &str, data: &[u8], sequence: i32) -> Message {
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
    Message::Binary(Bytes::from(response.encode_to_vec()))
}

/// One engine session. The `zh` direction hears Chinese speech; the `en`
/// direction produces a translation that arbitration must suppress.
async fn serve_direction(stream: TcpStream, seen: SeenKeys) {
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let key = request
            .headers()
            .get("x-api-app-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        seen.lock().push(key);
        Ok(response)
    };
    let Ok(ws) = accept_hdr_async(stream, callback).await else {
        return;
    };
    let (mut write, mut read) = ws.split();
    let mut source_language = String::new();

    while let Some(Ok(msg)) = read.next().await {
        let Message::Binary(data) = msg else {
            continue;
        };
        let request = TranslateRequest::decode(data.as_ref()).unwrap();
        let replies = if request.event == EventType::StartSession as i32 {
            source_language = request.request.unwrap_or_default().source_language;
            vec![frame(EventType::SessionStarted, "", &[], 0)]
        } else if request.event == EventType::TaskRequest as i32 {
            if source_language == "zh" {
                vec![
                    frame(EventType::SourceSubtitleStart, "你", &[], 0),
                    frame(EventType::SourceSubtitleEnd, "你好", &[], 1),
                    frame(EventType::TranslationSubtitleEnd, "Hello", &[], 1),
                    frame(EventType::TtsSentenceEnd, "", &[7, 7, 7], 1),
                ]
            } else {
                vec![frame(EventType::TranslationSubtitleEnd, "你好", &[], 1)]
            }
        } else if request.event == EventType::FinishSession as i32 {
            let _ = write
                .send(frame(EventType::SessionFinished, "", &[], 0))
                .await;
            let _ = write.close().await;
            return;
        } else {
            Vec::new()
        };
        for reply in replies {
            if write.send(reply).await.is_err() {
                return;
            }
        }
    }
}

async fn spawn_engine(seen: SeenKeys) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve_direction(stream, seen.clone()));
        }
    });
    addr
}

async fn spawn_server(engine_url: String) -> (SocketAddr, Arc<AppState>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        engine_url,
        engine_app_key: "test-app".to_string(),
        engine_access_key: "test-access".to_string(),
        engine_resource_id: "test-resource".to_string(),
        connect_timeout_seconds: 2,
        send_timeout_ms: 500,
        drain_timeout_ms: 1000,
        audio: AudioConfig::default(),
        default_source_language: "zh".to_string(),
        default_target_language: "en".to_string(),
        database_path: None,
    };
    let app_state = AppState::new(config).unwrap();
    let app = routes::create_app(app_state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, app_state)
}

async fn next_json<S>(read: &mut S) -> Value
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(3), read.next())
            .await
            .expect("timed out waiting for server message")
            .expect("server closed the socket")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_full_utterance_round_trip() {
    let seen = SeenKeys::default();
    let engine = spawn_engine(seen.clone()).await;
    let (server, app_state) = spawn_server(format!("ws://{engine}")).await;

    let (ws_stream, _) = connect_async(format!("ws://{server}/ws"))
        .await
        .expect("Failed to connect");
    let (mut write, mut read) = ws_stream.split();

    write
        .send(Message::Text(
            json!({"type": "start", "sourceLanguage": "zh", "targetLanguage": "en"})
                .to_string()
                .into(),
        ))
        .await
        .unwrap();

    let created = next_json(&mut read).await;
    assert_eq!(created["type"], "sessionCreated");
    let session_id = created["sessionId"].as_str().unwrap().to_string();
    assert_eq!(next_json(&mut read).await, json!({"type": "status", "status": "ready"}));
    assert_eq!(seen.lock().clone(), vec!["test-app", "test-app"]);

    write
        .send(Message::Text(
            json!({"type": "audio", "data": BASE64_STANDARD.encode([0u8; 320])})
                .to_string()
                .into(),
        ))
        .await
        .unwrap();

    // Interim before the lock passes because it matches its direction
    assert_eq!(
        next_json(&mut read).await,
        json!({"type": "asr", "text": "你", "isFinal": false})
    );
    assert_eq!(
        next_json(&mut read).await,
        json!({"type": "asr", "text": "你好", "isFinal": true, "sequence": 1})
    );
    assert_eq!(
        next_json(&mut read).await,
        json!({"type": "translation", "text": "Hello", "language": "en", "isFinal": true})
    );
    let audio = next_json(&mut read).await;
    assert_eq!(audio["type"], "audio");
    assert_eq!(audio["data"], BASE64_STANDARD.encode([7u8, 7, 7]));
    assert_eq!(audio["format"], "opus");
    assert_eq!(audio["sampleRate"], 24000);
    assert_eq!(next_json(&mut read).await, json!({"type": "sentenceComplete"}));

    let messages = app_state.store().session_messages(&session_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].source_text, "你好");
    assert_eq!(messages[0].target_text, "Hello");
    assert_eq!(messages[0].source_language, "zh");
    assert_eq!(messages[0].target_language, "en");

    write
        .send(Message::Text(json!({"type": "stop"}).to_string().into()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut read).await, json!({"type": "turnComplete"}));

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let record = app_state.store().get_session(&session_id).await.unwrap();
            if record.is_some_and(|record| !record.is_active) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session was not marked ended");

    write.close().await.unwrap();
}

#[tokio::test]
async fn test_start_fails_when_engine_unreachable() {
    // Bind and drop to get a port nothing listens on
    let unused = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let (server, app_state) = spawn_server(format!("ws://{unused}")).await;

    let (ws_stream, _) = connect_async(format!("ws://{server}/ws"))
        .await
        .expect("Failed to connect");
    let (mut write, mut read) = ws_stream.split();

    write
        .send(Message::Text(json!({"type": "start"}).to_string().into()))
        .await
        .unwrap();

    let error = next_json(&mut read).await;
    assert_eq!(error["type"], "error");
    assert!(
        error["message"]
            .as_str()
            .unwrap()
            .contains("Failed to connect to translation engine")
    );
    assert!(app_state.store().list_sessions(10).await.unwrap().is_empty());

    // The connection stays usable after a failed start
    write
        .send(Message::Text(json!({"type": "bogus"}).to_string().into()))
        .await
        .unwrap();
    let error = next_json(&mut read).await;
    assert!(
        error["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid message format")
    );
}
