//! Engine wired to in-process fakes.

use crate::state::AppState;
use apirec_core::ApiMetadata;
use apirec_memory::{
    EmbeddingError, EmbeddingProvider, EmbeddingService, IndexSpec, IndexedEntry, LocalIndex,
    RetryConfig, VectorIndex,
};
use apirec_providers::{
    ChatOptions, CompletionStream, Message, Provider, Result as ProviderResult, StopReason,
    StreamEvent,
};
use apirec_recommender::{ExplanationSynthesizer, RecommendationEngine, RecommendationService};
use async_trait::async_trait;
use std::sync::Arc;

/// Texts mentioning weather embed next to the weather API.
struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model(&self) -> &str {
        "keyword"
    }

    fn dimension(&self) -> usize {
        3
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                if t.to_lowercase().contains("weather") {
                    vec![1.0, 0.1, 0.0]
                } else {
                    vec![0.0, 1.0, 0.1]
                }
            })
            .collect())
    }
}

struct ScriptedChat {
    deltas: Vec<String>,
}

#[async_trait]
impl Provider for ScriptedChat {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat_stream(
        &self,
        _model: &str,
        _messages: &[Message],
        _options: Option<ChatOptions>,
    ) -> ProviderResult<CompletionStream> {
        let mut events: Vec<ProviderResult<StreamEvent>> = self
            .deltas
            .iter()
            .map(|d| Ok(StreamEvent::ContentDelta { delta: d.clone() }))
            .collect();
        events.push(Ok(StreamEvent::End {
            stop_reason: StopReason::EndTurn,
        }));
        Ok(Box::pin(futures::stream::iter(events)))
    }
}

fn engine(index: Arc<LocalIndex>, deltas: &[&str]) -> RecommendationEngine {
    let embeddings =
        EmbeddingService::new(Arc::new(KeywordEmbedder)).with_retry(RetryConfig::none());
    let chat = ScriptedChat {
        deltas: deltas.iter().map(|d| d.to_string()).collect(),
    };
    RecommendationEngine::new(
        RecommendationService::new(embeddings, index),
        ExplanationSynthesizer::new(Arc::new(chat)),
    )
}

/// Two indexed APIs; the chat model replies with `deltas`.
pub async fn state(deltas: &[&str]) -> AppState {
    let index = Arc::new(LocalIndex::in_memory(IndexSpec::new("apis-test", 3)));
    index.ensure_exists().await.unwrap();
    index
        .upsert(vec![
            IndexedEntry::new(
                "0",
                vec![1.0, 0.0, 0.0],
                ApiMetadata {
                    api_name: "Weather API".to_string(),
                    description: "Forecasts by city".to_string(),
                    endpoint: None,
                },
            ),
            IndexedEntry::new(
                "1",
                vec![0.0, 1.0, 0.0],
                ApiMetadata {
                    api_name: "Maps API".to_string(),
                    description: "Geocoding".to_string(),
                    endpoint: Some("/maps".to_string()),
                },
            ),
        ])
        .await
        .unwrap();
    AppState::new(engine(index, deltas))
}

/// An index that was never created.
pub fn state_without_index() -> AppState {
    let index = Arc::new(LocalIndex::in_memory(IndexSpec::new("apis-test", 3)));
    AppState::new(engine(index, &["unused"]))
}
