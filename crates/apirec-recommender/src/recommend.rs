//! Query-time retrieval.

use crate::error::RecommendError;
use apirec_core::RecommendationRecord;
use apirec_memory::{EmbeddingService, VectorIndex};
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of recommendations when the caller does not ask for a specific count.
pub const DEFAULT_TOP_K: usize = 5;

/// Embeds a query and returns the nearest catalog entries.
#[derive(Clone)]
pub struct RecommendationService {
    embeddings: EmbeddingService,
    index: Arc<dyn VectorIndex>,
    default_top_k: usize,
}

impl RecommendationService {
    /// Create a service.
    pub fn new(embeddings: EmbeddingService, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embeddings,
            index,
            default_top_k: DEFAULT_TOP_K,
        }
    }

    /// Set the default `top_k`.
    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }

    /// Default `top_k`.
    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Index backing this service.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Best-effort recommendations.
    ///
    /// Every failure collapses to an empty list; the cause is emitted as a
    /// `tracing` event. Use [`Self::try_recommend`] to observe it directly.
    pub async fn recommend(&self, query: &str, top_k: usize) -> Vec<RecommendationRecord> {
        match self.try_recommend(query, top_k).await {
            Ok(records) => records,
            Err(RecommendError::EmptyQuery) => {
                debug!("Ignoring empty query");
                Vec::new()
            }
            Err(e) => {
                warn!(query = %query, top_k, error = %e, "Recommendation failed, returning no results");
                Vec::new()
            }
        }
    }

    /// Recommendations, or the reason none could be produced.
    ///
    /// An empty index is not an error and yields `Ok(vec![])`.
    pub async fn try_recommend(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RecommendationRecord>, RecommendError> {
        if query.trim().is_empty() {
            return Err(RecommendError::EmptyQuery);
        }
        if top_k == 0 {
            return Err(RecommendError::InvalidTopK);
        }

        let vector = self.embeddings.embed(query).await?;
        let matches = self.index.query(&vector, top_k).await?;

        let records: Vec<RecommendationRecord> = matches
            .into_iter()
            .filter_map(|m| match m.metadata {
                Some(metadata) => Some(RecommendationRecord::from_metadata(m.score, metadata)),
                None => {
                    warn!(id = %m.id, "Dropping match without metadata");
                    None
                }
            })
            .collect();

        debug!(query = %query, results = records.len(), "Recommendations ready");
        Ok(records)
    }
}
