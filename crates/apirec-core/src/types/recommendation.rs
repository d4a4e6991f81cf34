//! Index metadata and recommendation records.

use serde::{Deserialize, Serialize};

/// Metadata stored with every indexed vector.
///
/// `endpoint` is omitted from the serialized form when absent, so the index
/// never holds an empty-string placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMetadata {
    /// API name.
    pub api_name: String,

    /// API description.
    pub description: String,

    /// Endpoint, when the catalog row had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// A recommended API, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    /// Similarity score reported by the index.
    pub score: f32,

    /// API name.
    pub api_name: String,

    /// API description.
    pub description: String,

    /// Endpoint, only present if the indexed metadata contained it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl RecommendationRecord {
    /// Build a record from a match score and its metadata.
    pub fn from_metadata(score: f32, metadata: ApiMetadata) -> Self {
        Self {
            score,
            api_name: metadata.api_name,
            description: metadata.description,
            endpoint: metadata.endpoint,
        }
    }

    /// Endpoint, if present and non-empty.
    pub fn display_endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref().filter(|e| !e.is_empty())
    }
}
