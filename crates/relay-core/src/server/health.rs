//! Health check endpoint.

use axum::Json;
use serde_json::{Value, json};

/// Static liveness indicator, no side effects.
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "ok": true }))
}
