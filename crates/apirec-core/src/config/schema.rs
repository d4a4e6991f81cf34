//! Configuration schema definitions.

use crate::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default base URL for the Zhipu open platform (OpenAI-compatible).
pub const ZHIPU_API_BASE: &str = "https://open.bigmodel.cn/api/paas/v4";

/// Default base URL for the Pinecone control plane.
pub const PINECONE_CONTROLLER_URL: &str = "https://api.pinecone.io";

/// Default index name.
pub const DEFAULT_INDEX_NAME: &str = "api-recommendations";

/// Dimension of the default embedding model (`embedding-2`).
pub const DEFAULT_DIMENSION: usize = 1024;

/// Main apirec configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chat (explanation) provider settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Vector index settings.
    #[serde(default)]
    pub index: IndexConfig,

    /// Batch ingestion settings.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Query settings.
    #[serde(default)]
    pub recommend: RecommendConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// API key. Falls back to `ZHIPUAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// API base URL.
    #[serde(default = "default_zhipu_base")]
    pub base_url: String,

    /// Embedding model.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected vector dimension.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Retries for transient provider errors.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries, doubled per attempt.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_zhipu_base(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_zhipu_base() -> String {
    ZHIPU_API_BASE.to_string()
}

fn default_embedding_model() -> String {
    "embedding-2".to_string()
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

/// Chat provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// API key. Falls back to the embedding key, then `ZHIPUAI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// API base URL.
    #[serde(default = "default_zhipu_base")]
    pub base_url: String,

    /// Chat model used for explanations.
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_zhipu_base(),
            model: default_chat_model(),
            temperature: None,
            max_tokens: None,
        }
    }
}

fn default_chat_model() -> String {
    "glm-4".to_string()
}

/// Vector index backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Managed Pinecone serverless index.
    #[default]
    Pinecone,

    /// In-process index persisted to a local JSON file.
    Local,
}

/// Similarity metric of an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    Dotproduct,
}

impl Metric {
    /// Wire name of the metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Dotproduct => "dotproduct",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Which backend to use.
    #[serde(default)]
    pub backend: IndexBackend,

    /// Index name.
    #[serde(default = "default_index_name")]
    pub name: String,

    /// Declared vector dimension; must equal `embedding.dimension`.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Similarity metric.
    #[serde(default)]
    pub metric: Metric,

    /// Serverless cloud.
    #[serde(default = "default_cloud")]
    pub cloud: String,

    /// Serverless region.
    #[serde(default = "default_region")]
    pub region: String,

    /// Pinecone API key. Falls back to `PINECONE_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Pinecone control plane URL.
    #[serde(default = "default_controller_url")]
    pub controller_url: String,

    /// How long to wait for a new index to become ready.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,

    /// File backing the local index. Defaults to `~/.apirec/indexes/<name>.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            name: default_index_name(),
            dimension: default_dimension(),
            metric: Metric::default(),
            cloud: default_cloud(),
            region: default_region(),
            api_key: None,
            controller_url: default_controller_url(),
            ready_timeout_secs: default_ready_timeout_secs(),
            local_path: None,
        }
    }
}

fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_controller_url() -> String {
    PINECONE_CONTROLLER_URL.to_string()
}

fn default_ready_timeout_secs() -> u64 {
    60
}

/// Batch ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Records per upsert batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches, in milliseconds.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Concurrent embedding calls within a batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_concurrency() -> usize {
    1
}

/// Query configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Default number of recommendations.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind mode.
    #[serde(default)]
    pub bind: BindMode,

    /// Port number.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable permissive CORS.
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: BindMode::default(),
            port: default_port(),
            cors: true,
        }
    }
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

/// Bind mode for the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    /// Bind to loopback only (127.0.0.1).
    #[default]
    Loopback,

    /// Bind to all interfaces.
    Lan,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable.
    #[default]
    Pretty,

    /// One JSON object per line.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.index.name, "api-recommendations");
        assert_eq!(config.index.dimension, 1024);
        assert_eq!(config.index.metric, Metric::Cosine);
        assert_eq!(config.embedding.model, "embedding-2");
        assert_eq!(config.chat.model, "glm-4");
        assert_eq!(config.ingest.batch_size, 10);
        assert_eq!(config.ingest.batch_delay_ms, 1000);
        assert_eq!(config.recommend.top_k, 5);
        assert_eq!(config.gateway.bind, BindMode::Loopback);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = Config::default();
        config.index.backend = IndexBackend::Local;
        config.embedding.api_key = Some(SecretString::new("zhipu-key"));

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.index.backend, IndexBackend::Local);
        assert_eq!(
            parsed.embedding.api_key.as_ref().map(SecretString::expose_secret),
            Some("zhipu-key")
        );
        assert!(!json.contains("local_path"));
    }

    #[test]
    fn test_metric_wire_names() {
        assert_eq!(Metric::Cosine.as_str(), "cosine");
        let parsed: Metric = serde_json::from_str("\"dotproduct\"").unwrap();
        assert_eq!(parsed, Metric::Dotproduct);
    }
}
