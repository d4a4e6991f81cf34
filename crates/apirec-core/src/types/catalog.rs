//! Catalog record types.

use super::ApiMetadata;
use serde::{Deserialize, Serialize};

/// Label preceding the API name in embedding text.
pub const NAME_LABEL: &str = "API名称";

/// Label preceding the description in embedding text.
pub const DESCRIPTION_LABEL: &str = "描述";

/// Label preceding the endpoint in embedding text.
pub const ENDPOINT_LABEL: &str = "接口";

/// One API entry read from the catalog.
///
/// Only lives for the duration of an ingestion run; what survives is the
/// [`ApiMetadata`] stored next to its vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRecord {
    /// Stable identifier, reused as the index entry id.
    pub id: String,

    /// API name.
    pub name: String,

    /// What the API does.
    pub description: String,

    /// Endpoint, if the catalog had a non-empty value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl ApiRecord {
    /// Create a record without an endpoint.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            endpoint: None,
        }
    }

    /// Set the endpoint. Blank values leave the endpoint unset.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = if endpoint.trim().is_empty() {
            None
        } else {
            Some(endpoint)
        };
        self
    }

    /// Canonical text that gets embedded for this record.
    ///
    /// Field order is fixed (name, description, endpoint) and the endpoint
    /// line only appears when the endpoint is non-empty. Changing this
    /// changes every vector in the index.
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![
            format!("{}: {}", NAME_LABEL, self.name),
            format!("{}: {}", DESCRIPTION_LABEL, self.description),
        ];
        if let Some(endpoint) = self.endpoint.as_deref().filter(|e| !e.is_empty()) {
            parts.push(format!("{}: {}", ENDPOINT_LABEL, endpoint));
        }
        parts.join("\n")
    }

    /// Metadata persisted alongside the record's vector.
    pub fn metadata(&self) -> ApiMetadata {
        ApiMetadata {
            api_name: self.name.clone(),
            description: self.description.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}
