//! SQLite backed [`TurnStore`].

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat, SubsecRound, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use super::{
    NewUtterance, PersistedUtterance, SessionRecord, StoreError, StoreResult, TurnStore,
    default_title,
};

const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    source_language TEXT NOT NULL,
    target_language TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
    sequence INTEGER NOT NULL,
    source_text TEXT NOT NULL,
    target_text TEXT NOT NULL,
    source_language TEXT NOT NULL,
    target_language TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, id);
CREATE INDEX IF NOT EXISTS idx_sessions_updated ON sessions(updated_at DESC);
"#;

const SESSION_COLUMNS: &str = "session_id, title, source_language, target_language, created_at, updated_at, is_active";
const MESSAGE_COLUMNS: &str = "id, session_id, sequence, source_text, target_text, source_language, target_language, created_at";

/// Store over a single SQLite connection.
///
/// Queries run on the blocking pool; the connection is shared behind a mutex.
#[derive(Clone)]
pub struct SqliteTurnStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTurnStore {
    /// Open (or create) the database at `path` and apply migrations.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Database(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }
        let store = Self::init(Connection::open(path)?)?;
        info!("Opened utterance database at {}", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(MIGRATIONS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await?
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        session_id: row.get(0)?,
        title: row.get(1)?,
        source_language: row.get(2)?,
        target_language: row.get(3)?,
        created_at: decode_time(row, 4)?,
        updated_at: decode_time(row, 5)?,
        is_active: row.get::<_, i64>(6)? != 0,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<PersistedUtterance> {
    Ok(PersistedUtterance {
        id: row.get(0)?,
        session_id: row.get(1)?,
        sequence: row.get(2)?,
        source_text: row.get(3)?,
        target_text: row.get(4)?,
        source_language: row.get(5)?,
        target_language: row.get(6)?,
        created_at: decode_time(row, 7)?,
    })
}

#[async_trait]
impl TurnStore for SqliteTurnStore {
    async fn create_session(
        &self,
        session_id: &str,
        source_language: &str,
        target_language: &str,
        title: Option<&str>,
    ) -> StoreResult<SessionRecord> {
        let created = now();
        let record = SessionRecord {
            session_id: session_id.to_string(),
            title: title
                .map(str::to_string)
                .unwrap_or_else(|| default_title(Local::now())),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            created_at: created,
            updated_at: created,
            is_active: true,
        };

        let row = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO sessions (session_id, title, source_language, target_language, created_at, updated_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
                params![
                    row.session_id,
                    row.title,
                    row.source_language,
                    row.target_language,
                    encode_time(&row.created_at),
                    encode_time(&row.updated_at),
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(record)
    }

    async fn add_message(&self, utterance: NewUtterance) -> StoreResult<PersistedUtterance> {
        self.with_conn(move |conn| {
            let created = now();
            let tx = conn.transaction()?;
            let touched = tx.execute(
                "UPDATE sessions SET updated_at = ?1 WHERE session_id = ?2",
                params![encode_time(&created), utterance.session_id],
            )?;
            if touched == 0 {
                return Err(StoreError::NotFound(utterance.session_id));
            }
            tx.execute(
                "INSERT INTO messages (session_id, sequence, source_text, target_text, source_language, target_language, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    utterance.session_id,
                    utterance.sequence,
                    utterance.source_text,
                    utterance.target_text,
                    utterance.source_language,
                    utterance.target_language,
                    encode_time(&created),
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(PersistedUtterance {
                id,
                session_id: utterance.session_id,
                sequence: utterance.sequence,
                source_text: utterance.source_text,
                target_text: utterance.target_text,
                source_language: utterance.source_language,
                target_language: utterance.target_language,
                created_at: created,
            })
        })
        .await
    }

    async fn end_session(&self, session_id: &str) -> StoreResult<()> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            let touched = conn.execute(
                "UPDATE sessions SET is_active = 0, updated_at = ?1 WHERE session_id = ?2",
                params![encode_time(&now()), session_id],
            )?;
            if touched == 0 {
                return Err(StoreError::NotFound(session_id));
            }
            Ok(())
        })
        .await
    }

    async fn get_session(&self, session_id: &str) -> StoreResult<Option<SessionRecord>> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            let record = conn
                .query_row(
                    &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
                    params![session_id],
                    session_from_row,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn list_sessions(&self, limit: usize) -> StoreResult<Vec<SessionRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY updated_at DESC, id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], session_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn active_session(&self) -> StoreResult<Option<SessionRecord>> {
        self.with_conn(|conn| {
            let record = conn
                .query_row(
                    &format!(
                        "SELECT {SESSION_COLUMNS} FROM sessions WHERE is_active = 1 ORDER BY updated_at DESC, id DESC LIMIT 1"
                    ),
                    [],
                    session_from_row,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn session_messages(&self, session_id: &str) -> StoreResult<Vec<PersistedUtterance>> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE session_id = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![session_id], message_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn update_title(&self, session_id: &str, title: &str) -> StoreResult<()> {
        let session_id = session_id.to_string();
        let title = title.to_string();
        self.with_conn(move |conn| {
            let touched = conn.execute(
                "UPDATE sessions SET title = ?1, updated_at = ?2 WHERE session_id = ?3",
                params![title, encode_time(&now()), session_id],
            )?;
            if touched == 0 {
                return Err(StoreError::NotFound(session_id));
            }
            Ok(())
        })
        .await
    }
}
