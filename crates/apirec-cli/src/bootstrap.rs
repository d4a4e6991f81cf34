//! Wiring of providers, index and services from configuration.

use anyhow::Context;
use apirec_core::config::{Config, IndexBackend};
use apirec_memory::{
    EmbeddingService, IndexSpec, LocalIndex, PineconeIndex, RetryConfig, VectorIndex,
    ZhipuEmbeddings,
};
use apirec_providers::{ChatOptions, ZhipuProvider};
use apirec_recommender::{
    BatchPolicy, ExplanationSynthesizer, IngestionPipeline, RecommendationEngine,
    RecommendationService,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Load and validate configuration.
///
/// An explicit path must exist; otherwise the default location is tried and
/// environment defaults are used when no file is present.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default().context("Failed to load config")?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Embedding service for the configured model.
pub fn embedding_service(config: &Config) -> anyhow::Result<EmbeddingService> {
    let key = config.embedding_api_key()?;
    let provider = ZhipuEmbeddings::new(key.expose_secret())?
        .with_model(&config.embedding.model)
        .with_base_url(&config.embedding.base_url)
        .with_dimension(config.embedding.dimension);

    let retry = RetryConfig::default()
        .with_max_retries(config.embedding.max_retries)
        .with_base_delay(Duration::from_millis(config.embedding.retry_base_delay_ms));

    Ok(EmbeddingService::new(Arc::new(provider)).with_retry(retry))
}

/// Vector index for the configured backend.
pub fn vector_index(config: &Config) -> anyhow::Result<Arc<dyn VectorIndex>> {
    let spec = IndexSpec::from(&config.index);

    match config.index.backend {
        IndexBackend::Local => {
            let path = config.local_index_path()?;
            debug!(index = %spec.name, path = %path.display(), "Using local index");
            let index = LocalIndex::open(spec, path.clone())
                .with_context(|| format!("Failed to open local index {}", path.display()))?;
            Ok(Arc::new(index))
        }
        IndexBackend::Pinecone => {
            let key = config.index_api_key()?;
            debug!(index = %spec.name, "Using Pinecone index");
            let index = PineconeIndex::new(key.expose_secret(), spec)?
                .with_controller_url(&config.index.controller_url)
                .with_serverless(&config.index.cloud, &config.index.region)
                .with_ready_timeout(Duration::from_secs(config.index.ready_timeout_secs));
            Ok(Arc::new(index))
        }
    }
}

/// Explanation synthesizer for the configured chat model.
pub fn synthesizer(config: &Config) -> anyhow::Result<ExplanationSynthesizer> {
    let key = config.chat_api_key()?;
    let provider = ZhipuProvider::new(key.expose_secret())?.with_base_url(&config.chat.base_url);

    let options = ChatOptions {
        max_tokens: config.chat.max_tokens,
        temperature: config.chat.temperature,
        top_p: None,
    };

    Ok(ExplanationSynthesizer::new(Arc::new(provider))
        .with_model(&config.chat.model)
        .with_options(options))
}

/// Ingestion pipeline using the configured batch policy.
pub fn ingestion_pipeline(config: &Config) -> anyhow::Result<IngestionPipeline> {
    Ok(
        IngestionPipeline::new(embedding_service(config)?, vector_index(config)?)
            .with_policy(BatchPolicy::from(&config.ingest)),
    )
}

/// Retrieval service.
pub fn recommendation_service(config: &Config) -> anyhow::Result<RecommendationService> {
    Ok(
        RecommendationService::new(embedding_service(config)?, vector_index(config)?)
            .with_default_top_k(config.recommend.top_k),
    )
}

/// Retrieval plus explanation.
pub fn engine(config: &Config) -> anyhow::Result<RecommendationEngine> {
    Ok(RecommendationEngine::new(
        recommendation_service(config)?,
        synthesizer(config)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apirec_core::config::ConfigBuilder;
    use apirec_core::SecretString;

    fn local_config(dir: &Path) -> Config {
        let mut config = ConfigBuilder::new()
            .index_backend(IndexBackend::Local)
            .index_name("apis-test")
            .dimension(3)
            .top_k(2)
            .build();
        config.index.local_path = Some(dir.join("apis-test.json"));
        config.embedding.api_key = Some(SecretString::new("test-key"));
        config
    }

    #[test]
    fn test_load_config_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("missing.json5"))).is_err());

        let path = dir.path().join("apirec.json5");
        std::fs::write(&path, "{ recommend: { top_k: 3 } }").unwrap();
        assert_eq!(load_config(Some(&path)).unwrap().recommend.top_k, 3);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apirec.json5");
        std::fs::write(&path, "{ recommend: { top_k: 0 } }").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[tokio::test]
    async fn test_local_index_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path());

        let index = vector_index(&config).unwrap();
        assert_eq!(index.spec().name, "apis-test");
        assert_eq!(index.spec().dimension, 3);
        assert!(index.ensure_exists().await.unwrap());
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[test]
    fn test_services_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = local_config(dir.path());

        let service = recommendation_service(&config).unwrap();
        assert_eq!(service.default_top_k(), 2);

        let synthesizer = synthesizer(&config).unwrap();
        assert_eq!(synthesizer.model(), "glm-4");

        let pipeline = ingestion_pipeline(&config).unwrap();
        assert_eq!(pipeline.policy().batch_size, 10);
    }
}
