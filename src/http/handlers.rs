//! Built-in routes.

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

/// Liveness check.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Routes served when the binary runs standalone.
pub fn routes() -> Router {
    Router::new().route("/health", get(health))
}
