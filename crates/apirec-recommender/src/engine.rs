//! Retrieval plus explanation, as served to callers.

use crate::explain::{ExplanationStream, ExplanationSynthesizer};
use crate::recommend::RecommendationService;
use apirec_core::RecommendationRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Full answer to one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    /// Ranked recommendations.
    pub recommendations: Vec<RecommendationRecord>,

    /// Generated explanation; empty when none could be produced.
    pub explanation: String,
}

/// Answers queries with recommendations and an explanation.
#[derive(Clone)]
pub struct RecommendationEngine {
    recommender: RecommendationService,
    synthesizer: ExplanationSynthesizer,
}

impl RecommendationEngine {
    /// Create an engine.
    pub fn new(recommender: RecommendationService, synthesizer: ExplanationSynthesizer) -> Self {
        Self {
            recommender,
            synthesizer,
        }
    }

    /// Retrieval half.
    pub fn recommender(&self) -> &RecommendationService {
        &self.recommender
    }

    /// Explanation half.
    pub fn synthesizer(&self) -> &ExplanationSynthesizer {
        &self.synthesizer
    }

    /// Recommendations and a streamed explanation.
    ///
    /// The chat model is not called when nothing was recommended.
    pub async fn answer_stream(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> (Vec<RecommendationRecord>, ExplanationStream) {
        let top_k = top_k.unwrap_or_else(|| self.recommender.default_top_k());
        let recommendations = self.recommender.recommend(query, top_k).await;

        if recommendations.is_empty() {
            info!(query = %query, "No recommendations, skipping explanation");
            return (recommendations, ExplanationStream::empty());
        }

        let explanation = self.synthesizer.synthesize(query, &recommendations).await;
        (recommendations, explanation)
    }

    /// Recommendations and the fully collected explanation.
    pub async fn answer(&self, query: &str, top_k: Option<usize>) -> RecommendationResponse {
        let (recommendations, stream) = self.answer_stream(query, top_k).await;
        let explanation = stream.collect_text().await;
        RecommendationResponse {
            recommendations,
            explanation,
        }
    }
}
