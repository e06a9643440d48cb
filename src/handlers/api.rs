use axum::response::Json;
use serde_json::{Value, json};

/// Health check handler
/// Returns a simple JSON response indicating the server is running
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "OK"
    }))
}
