//! Vector index abstraction.

use crate::error::IndexError;
use apirec_core::config::{IndexConfig, Metric};
use apirec_core::ApiMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Name and shape of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,

    /// Vector dimension.
    pub dimension: usize,

    /// Similarity metric.
    pub metric: Metric,
}

impl IndexSpec {
    /// Cosine index description.
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: Metric::Cosine,
        }
    }

    /// Set the metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Reject vectors that do not match the declared dimension.
    pub fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Why an existing index of this shape cannot be used, if it cannot.
    pub fn incompatibility(&self, dimension: usize, metric: Metric) -> Option<String> {
        let mut reasons = Vec::new();
        if dimension != self.dimension {
            reasons.push(format!(
                "dimension {} (expected {})",
                dimension, self.dimension
            ));
        }
        if metric != self.metric {
            reasons.push(format!("metric {} (expected {})", metric, self.metric));
        }
        if reasons.is_empty() {
            None
        } else {
            Some(reasons.join(", "))
        }
    }
}

impl From<&IndexConfig> for IndexSpec {
    fn from(config: &IndexConfig) -> Self {
        Self {
            name: config.name.clone(),
            dimension: config.dimension,
            metric: config.metric,
        }
    }
}

/// A stored vector with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedEntry {
    /// Record id; last write wins.
    pub id: String,

    /// Embedding vector.
    pub vector: Vec<f32>,

    /// Metadata returned with query matches.
    pub metadata: ApiMetadata,
}

impl IndexedEntry {
    /// Create an entry.
    pub fn new(id: impl Into<String>, vector: Vec<f32>, metadata: ApiMetadata) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata,
        }
    }
}

/// One result of a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// Record id.
    pub id: String,

    /// Similarity score, higher is more similar.
    pub score: f32,

    /// Metadata, absent if the stored entry had none or it was unreadable.
    pub metadata: Option<ApiMetadata>,
}

/// Sort matches by descending score, breaking ties by ascending id.
pub fn sort_matches(matches: &mut [QueryMatch]) {
    matches.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
}

/// A similarity-search collection of [`IndexedEntry`] values.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name and declared shape of this index.
    fn spec(&self) -> &IndexSpec;

    /// Create the index if absent. Returns `true` when it was created.
    ///
    /// Fails with [`IndexError::IncompatibleIndex`] when an index with the
    /// same name exists with another dimension or metric.
    async fn ensure_exists(&self) -> Result<bool, IndexError>;

    /// Delete the index. Returns `true` when it existed.
    async fn delete(&self) -> Result<bool, IndexError>;

    /// Write a batch of entries, overwriting existing ids. Returns the
    /// number of entries written; a partial write is an error.
    async fn upsert(&self, entries: Vec<IndexedEntry>) -> Result<usize, IndexError>;

    /// Up to `top_k` nearest entries, ordered by [`sort_matches`].
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>, IndexError>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize, IndexError>;
}
