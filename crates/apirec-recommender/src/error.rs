//! Recommender error types.

use apirec_memory::{EmbeddingError, IndexError};
use apirec_providers::ProviderError;
use thiserror::Error;

/// The catalog lacks mandatory columns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Catalog is missing required column(s): {}", .missing.join(", "))]
pub struct SchemaError {
    /// Names of every missing column.
    pub missing: Vec<String>,
}

/// Errors while reading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON / JSON Lines.
    #[error("Parse error{}: {message}", .line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    Parse {
        line: Option<usize>,
        message: String,
    },

    /// Rows must be JSON objects.
    #[error("Row {row} is not an object")]
    NotAnObject { row: usize },

    /// Mandatory columns are missing.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors that abort an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The catalog could not be read or is malformed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The index could not be created, reset or verified.
    #[error("Index provisioning failed: {0}")]
    Provision(#[source] IndexError),

    /// Batch policy is unusable.
    #[error("Invalid batch policy: {0}")]
    InvalidPolicy(String),
}

impl From<SchemaError> for IngestError {
    fn from(err: SchemaError) -> Self {
        Self::Catalog(CatalogError::Schema(err))
    }
}

/// Why a recommendation request produced no results.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The query was blank.
    #[error("Query is empty")]
    EmptyQuery,

    /// `top_k` was zero.
    #[error("top_k must be greater than 0")]
    InvalidTopK,

    /// The query could not be embedded.
    #[error("Query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The index query failed.
    #[error("Index query failed: {0}")]
    Index(#[from] IndexError),
}

/// The generation request failed before streaming began.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Provider rejected or failed the request.
    #[error("Explanation request failed: {0}")]
    Provider(#[from] ProviderError),
}
