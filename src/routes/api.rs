use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, sessions};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/api/sessions", get(sessions::list_sessions))
        .route("/api/sessions/active", get(sessions::active_session))
        .route(
            "/api/sessions/{session_id}",
            get(sessions::get_session).patch(sessions::update_session_title),
        )
        .layer(TraceLayer::new_for_http())
}
