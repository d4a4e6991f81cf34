//! Configuration loading and persistence.

use super::{Config, IndexBackend, LogFormat, LogLevel};
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use crate::secret::SecretString;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Path of the config file: `$APIREC_CONFIG` or `~/.apirec/apirec.json5`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        match env::get_var(env::vars::APIREC_CONFIG) {
            Some(path) => Ok(paths::expand_tilde(&path)),
            None => paths::config_file(),
        }
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.embedding.dimension == 0 {
            errors.push("Embedding dimension must be greater than 0".to_string());
        }
        if self.index.dimension != self.embedding.dimension {
            errors.push(format!(
                "Index dimension {} does not match embedding dimension {}",
                self.index.dimension, self.embedding.dimension
            ));
        }
        if self.index.name.trim().is_empty() {
            errors.push("Index name must not be empty".to_string());
        }
        if self.embedding.model.trim().is_empty() {
            errors.push("Embedding model must not be empty".to_string());
        }
        if self.chat.model.trim().is_empty() {
            errors.push("Chat model must not be empty".to_string());
        }
        if self.ingest.batch_size == 0 {
            errors.push("Ingest batch_size must be greater than 0".to_string());
        }
        if self.ingest.concurrency == 0 {
            errors.push("Ingest concurrency must be greater than 0".to_string());
        }
        if self.recommend.top_k == 0 {
            errors.push("Recommend top_k must be greater than 0".to_string());
        }
        if self.gateway.port == 0 {
            errors.push("Gateway port cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load configuration from the default path, falling back to defaults if no file exists.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load_default() {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::from_env_defaults()),
            Err(e) => Err(e),
        }
    }

    /// Create a Config from defaults, enhanced by environment variable detection.
    ///
    /// Without a Pinecone key the local index backend is selected so that
    /// `ingest` and `ask` work without any managed service.
    pub fn from_env_defaults() -> Self {
        let mut config = Self::default();

        if env::get_var(env::vars::PINECONE_API_KEY).is_none() {
            config.index.backend = IndexBackend::Local;
        }

        if let Some(port) = env::get_u16(env::vars::APIREC_PORT) {
            config.gateway.port = port;
        }

        config
    }

    /// API key for the embedding provider.
    pub fn embedding_api_key(&self) -> Result<SecretString, ConfigError> {
        self.embedding
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| env::get_var(env::vars::ZHIPUAI_API_KEY).map(SecretString::new))
            .ok_or(ConfigError::MissingCredential(env::vars::ZHIPUAI_API_KEY))
    }

    /// API key for the chat provider.
    pub fn chat_api_key(&self) -> Result<SecretString, ConfigError> {
        match self.chat.api_key.clone().filter(|k| !k.is_empty()) {
            Some(key) => Ok(key),
            None => self.embedding_api_key(),
        }
    }

    /// API key for the Pinecone index.
    pub fn index_api_key(&self) -> Result<SecretString, ConfigError> {
        self.index
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| env::get_var(env::vars::PINECONE_API_KEY).map(SecretString::new))
            .ok_or(ConfigError::MissingCredential(env::vars::PINECONE_API_KEY))
    }

    /// File backing the local index.
    pub fn local_index_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.index.local_path {
            Some(path) => Ok(path.clone()),
            None => paths::local_index_file(&self.index.name),
        }
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the index backend.
    pub fn index_backend(mut self, backend: IndexBackend) -> Self {
        self.config.index.backend = backend;
        self
    }

    /// Set the index name.
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.config.index.name = name.into();
        self
    }

    /// Set the vector dimension for both the embedding model and the index.
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.config.embedding.dimension = dimension;
        self.config.index.dimension = dimension;
        self
    }

    /// Set the ingest batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.ingest.batch_size = batch_size;
        self
    }

    /// Set the pause between ingest batches.
    pub fn batch_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.ingest.batch_delay_ms = delay_ms;
        self
    }

    /// Set the default number of recommendations.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.recommend.top_k = top_k;
        self
    }

    /// Set the gateway port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.gateway.port = port;
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Set the log format.
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        self.config
    }
}
