//! HTTP route handlers.
//!
//! - `recommend`: recommendations with a collected or streamed explanation
//! - `health`: liveness plus index reachability

pub mod health;
pub mod recommend;

use crate::error::ServerError;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Server name, version and endpoints (GET /).
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "apirec",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /recommend",
            "POST /recommend/stream",
            "GET /health"
        ]
    }))
}

/// Fallback for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
