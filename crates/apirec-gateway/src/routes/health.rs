use crate::state::AppState;
use apirec_memory::VectorIndex;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::warn;

/// Health check. Reports 503 when the index cannot be reached.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let index = state.engine.recommender().index();
    let name = index.spec().name.clone();

    match index.count().await {
        Ok(vectors) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "index": name,
                "vectors": vectors,
                "uptime_seconds": state.uptime_secs(),
            })),
        ),
        Err(e) => {
            warn!(index = %name, error = %e, "Health check could not reach index");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "index": name,
                    "error": e.to_string(),
                    "uptime_seconds": state.uptime_secs(),
                })),
            )
        }
    }
}
