//! Read access to recorded sessions and their utterances.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::core::store::{SessionRecord, SessionTranscript};
use crate::errors::{AppError, AppResult, SESSION_NOT_FOUND};
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<SessionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTitle {
    #[serde(default)]
    pub title: String,
}

/// `GET /api/sessions?limit=N`
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<SessionList>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let sessions = state.store().list_sessions(limit).await?;
    Ok(Json(SessionList { sessions }))
}

/// `GET /api/sessions/active`
pub async fn active_session(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<SessionTranscript>> {
    let store = state.store();
    let Some(session) = store.active_session().await? else {
        return Ok(Json(SessionTranscript::empty()));
    };
    let transcript = store
        .transcript(&session.session_id)
        .await?
        .unwrap_or_else(SessionTranscript::empty);
    Ok(Json(transcript))
}

/// `GET /api/sessions/{session_id}`
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionTranscript>> {
    state
        .store()
        .transcript(&session_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(SESSION_NOT_FOUND.to_string()))
}

/// `PATCH /api/sessions/{session_id}`
pub async fn update_session_title(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(body): Json<UpdateTitle>,
) -> AppResult<Json<Value>> {
    state.store().update_title(&session_id, &body.title).await?;
    info!("[{}] Title updated", session_id);
    Ok(Json(json!({ "success": true })))
}
