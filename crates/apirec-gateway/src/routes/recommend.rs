use crate::error::{ServerError, ServerResult};
use crate::state::AppState;
use apirec_recommender::RecommendationResponse;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use tracing::info;

/// Body of both recommend routes.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendRequest {
    /// Free-text need. Missing is treated as blank.
    #[serde(default)]
    pub query: String,

    /// Result count; the engine default when absent.
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl RecommendRequest {
    fn validate(payload: Result<Json<Self>, JsonRejection>) -> ServerResult<Self> {
        let Json(request) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
        if request.query.trim().is_empty() {
            return Err(ServerError::EmptyQuery);
        }
        if request.top_k == Some(0) {
            return Err(ServerError::BadRequest(
                "top_k must be greater than 0".to_string(),
            ));
        }
        Ok(request)
    }
}

/// POST /recommend
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> ServerResult<Json<RecommendationResponse>> {
    let request = RecommendRequest::validate(payload)?;
    info!(query = %request.query, top_k = ?request.top_k, "Recommend request");

    let response = state.engine.answer(&request.query, request.top_k).await;
    Ok(Json(response))
}

/// POST /recommend/stream
///
/// Emits one `recommendations` event, a `delta` event per explanation
/// chunk, then `done`.
pub async fn recommend_stream(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> ServerResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let request = RecommendRequest::validate(payload)?;
    info!(query = %request.query, top_k = ?request.top_k, "Streaming recommend request");

    let (recommendations, explanation) =
        state.engine.answer_stream(&request.query, request.top_k).await;

    let head = Event::default()
        .event("recommendations")
        .json_data(&recommendations)
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    let deltas = explanation.map(|chunk| Event::default().event("delta").data(chunk.text));
    let events = stream::once(async move { head })
        .chain(deltas)
        .chain(stream::once(async { Event::default().event("done").data("") }))
        .map(Ok);

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
