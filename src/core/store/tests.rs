use std::time::Duration;

use super::*;

fn utterance(session_id: &str, sequence: i64, source: &str, target: &str) -> NewUtterance {
    NewUtterance {
        session_id: session_id.to_string(),
        sequence,
        source_text: source.to_string(),
        target_text: target.to_string(),
        source_language: "zh".to_string(),
        target_language: "en".to_string(),
    }
}

async fn exercise_lifecycle(store: &dyn TurnStore) {
    let created = store
        .create_session("s1", "zh", "en", None)
        .await
        .unwrap();
    assert!(created.is_active);
    assert!(created.title.starts_with("Meeting "));

    store
        .add_message(utterance("s1", 0, "你好", "Hello"))
        .await
        .unwrap();
    store
        .add_message(utterance("s1", 1, "", "Good morning"))
        .await
        .unwrap();

    let messages = store.session_messages("s1").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sequence, 0);
    assert_eq!(messages[0].source_text, "你好");
    assert_eq!(messages[1].sequence, 1);
    assert_eq!(messages[1].target_text, "Good morning");
    assert!(messages[0].id < messages[1].id);

    let transcript = store.transcript("s1").await.unwrap().unwrap();
    assert_eq!(transcript.session.unwrap().session_id, "s1");
    assert_eq!(transcript.messages.len(), 2);

    let session = store.get_session("s1").await.unwrap().unwrap();
    assert!(session.updated_at >= created.updated_at);
    assert_eq!(store.active_session().await.unwrap().unwrap().session_id, "s1");

    store.end_session("s1").await.unwrap();
    let session = store.get_session("s1").await.unwrap().unwrap();
    assert!(!session.is_active);
    assert!(store.active_session().await.unwrap().is_none());
}

async fn exercise_listing(store: &dyn TurnStore) {
    store.create_session("old", "zh", "en", Some("Old")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.create_session("new", "en", "ja", Some("New")).await.unwrap();

    let sessions = store.list_sessions(10).await.unwrap();
    let ids: Vec<_> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);

    // Appending to the older session moves it to the front
    tokio::time::sleep(Duration::from_millis(5)).await;
    store
        .add_message(utterance("old", 0, "一", "one"))
        .await
        .unwrap();
    let sessions = store.list_sessions(1).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].session_id, "old");

    store.update_title("new", "Renamed").await.unwrap();
    let renamed = store.get_session("new").await.unwrap().unwrap();
    assert_eq!(renamed.title, "Renamed");
    assert_eq!(renamed.source_language, "en");
    assert_eq!(renamed.target_language, "ja");
}

async fn exercise_missing(store: &dyn TurnStore) {
    assert!(store.get_session("nope").await.unwrap().is_none());
    assert!(store.session_messages("nope").await.unwrap().is_empty());
    assert!(store.transcript("nope").await.unwrap().is_none());
    assert!(matches!(
        store.end_session("nope").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.update_title("nope", "x").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.add_message(utterance("nope", 0, "a", "b")).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_memory_store_lifecycle() {
    exercise_lifecycle(&MemoryTurnStore::new()).await;
}

#[tokio::test]
async fn test_memory_store_listing() {
    exercise_listing(&MemoryTurnStore::new()).await;
}

#[tokio::test]
async fn test_memory_store_missing_session() {
    exercise_missing(&MemoryTurnStore::new()).await;
}

#[tokio::test]
async fn test_sqlite_store_lifecycle() {
    exercise_lifecycle(&SqliteTurnStore::open_in_memory().unwrap()).await;
}

#[tokio::test]
async fn test_sqlite_store_listing() {
    exercise_listing(&SqliteTurnStore::open_in_memory().unwrap()).await;
}

#[tokio::test]
async fn test_sqlite_store_missing_session() {
    exercise_missing(&SqliteTurnStore::open_in_memory().unwrap()).await;
}

#[tokio::test]
async fn test_sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("sessions.db");

    {
        let store = SqliteTurnStore::open(&path).unwrap();
        store.create_session("s1", "zh", "en", None).await.unwrap();
        store
            .add_message(utterance("s1", 0, "你好", "Hello"))
            .await
            .unwrap();
    }

    let store = SqliteTurnStore::open(&path).unwrap();
    let messages = store.session_messages("s1").await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].target_text, "Hello");
}

#[tokio::test]
async fn test_duplicate_session_id_rejected() {
    let store = SqliteTurnStore::open_in_memory().unwrap();
    store.create_session("s1", "zh", "en", None).await.unwrap();
    assert!(matches!(
        store.create_session("s1", "zh", "en", None).await,
        Err(StoreError::Database(_))
    ));
}

#[test]
fn test_default_title_format() {
    let now = chrono::Local::now();
    let title = default_title(now);
    assert_eq!(title, format!("Meeting {}", now.format("%Y-%m-%d %H:%M")));
}

#[test]
fn test_records_serialize_camel_case() {
    let now = chrono::Utc::now();
    let record = SessionRecord {
        session_id: "s1".to_string(),
        title: "t".to_string(),
        source_language: "zh".to_string(),
        target_language: "en".to_string(),
        created_at: now,
        updated_at: now,
        is_active: true,
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["sessionId"], "s1");
    assert_eq!(json["sourceLanguage"], "zh");
    assert_eq!(json["isActive"], true);
    assert!(json.get("createdAt").is_some());
}
