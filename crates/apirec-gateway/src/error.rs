//! Gateway error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Message returned for a blank query.
pub const EMPTY_QUERY_MESSAGE: &str = "请输入查询内容";

pub type ServerResult<T> = Result<T, ServerError>;

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The query was blank.
    #[error("{}", EMPTY_QUERY_MESSAGE)]
    EmptyQuery,

    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Route does not exist.
    #[error("Not found")]
    NotFound,

    /// Anything else.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyQuery | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "EMPTY_QUERY",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.error_code(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::EmptyQuery.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServerError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_empty_query_message() {
        assert_eq!(ServerError::EmptyQuery.to_string(), EMPTY_QUERY_MESSAGE);
    }
}
