//! Request handlers, grouped by resource.

pub mod auth;
pub mod placement;
pub mod projects;

use axum::Json;
use serde_json::{json, Value};

pub async fn index() -> &'static str {
    "Beacon map API"
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
