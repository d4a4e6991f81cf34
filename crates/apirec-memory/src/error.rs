//! Embedding and index error types.

use thiserror::Error;

/// Errors from the embedding provider boundary.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Input text was empty or whitespace.
    #[error("Embedding input is empty")]
    EmptyInput,

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a non-success status.
    #[error("Embedding API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider returned a vector of the wrong length.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Provider returned fewer vectors than inputs.
    #[error("Expected {expected} embeddings, got {actual}")]
    MissingEmbedding { expected: usize, actual: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EmbeddingError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Transient errors: rate limiting, server errors, timeouts and connection failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors from the vector index boundary.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Index could not be created, described or deleted.
    #[error("Index provisioning failed: {0}")]
    Provision(String),

    /// An index with this name exists but with a different shape.
    #[error("Index '{name}' is incompatible: {reason}")]
    IncompatibleIndex { name: String, reason: String },

    /// Index does not exist.
    #[error("Index not found: {0}")]
    NotFound(String),

    /// A batch write failed; none of it should be considered stored.
    #[error("Upsert failed: {0}")]
    Write(String),

    /// A similarity query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// A vector does not match the index dimension.
    #[error("Vector dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `top_k` must be positive.
    #[error("top_k must be greater than 0")]
    InvalidTopK,

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IndexError {
    /// Create an incompatible index error.
    pub fn incompatible(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IncompatibleIndex {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
