//! Configuration types for the SDPM core library

use crate::ai::OllamaClient;
use crate::semantic::cache::{CachedEmbeddings, DEFAULT_CACHE_CAPACITY};
use crate::semantic::chunker::ChunkerConfig;
use crate::semantic::embeddings::{EmbeddingProvider, OllamaEmbeddings, DEFAULT_BATCH_SIZE};
use crate::{Result, SdpmError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Prefix for environment variable overrides, e.g. `SDPM__CHUNKER__SKIP_WINDOW`
pub const ENV_PREFIX: &str = "SDPM";

/// Separator between nested keys in environment variable names
pub const ENV_SEPARATOR: &str = "__";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdpmConfig {
    /// Chunking behaviour
    pub chunker: ChunkerConfig,
    /// Embedding service settings
    pub embedding: EmbeddingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Embedding service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Ollama server URL
    #[serde(default = "default_ollama_url")]
    pub url: Url,
    /// Embedding model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Texts per embedding batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Cached embeddings; 0 disables the cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_model(),
            timeout_seconds: default_timeout(),
            batch_size: default_batch_size(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl EmbeddingConfig {
    /// Builds the Ollama embedding provider described by this configuration
    ///
    /// The provider is wrapped in an embedding cache unless `cache_capacity`
    /// is 0.
    pub fn provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let client = OllamaClient::with_timeout(
            self.url.to_string(),
            Duration::from_secs(self.timeout_seconds),
        )?;
        let embeddings =
            OllamaEmbeddings::new(client, self.model.clone()).with_batch_size(self.batch_size);

        if self.cache_capacity == 0 {
            Ok(Arc::new(embeddings))
        } else {
            Ok(Arc::new(CachedEmbeddings::new(
                embeddings,
                self.cache_capacity,
            )))
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json, pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl SdpmConfig {
    /// Loads configuration from an optional file overlaid with environment
    /// variables
    ///
    /// Nested keys are separated by `__`, so `SDPM__CHUNKER__CHUNK_SIZE=768`
    /// overrides `chunker.chunk_size`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(SdpmError::not_found(path.display().to_string()));
            }
            builder = builder.add_source(config::File::from(path));
        }

        let config: SdpmConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        // Try YAML first, then JSON
        match serde_yaml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(_) => {
                let config = serde_json::from_str(&content)?;
                Ok(config)
            }
        }
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.chunker
            .validate()
            .map_err(|e| SdpmError::validation(e.to_string()))?;

        if self.embedding.url.scheme() != "http" && self.embedding.url.scheme() != "https" {
            return Err(SdpmError::validation(
                "Ollama URL must use http or https scheme",
            ));
        }

        if self.embedding.model.trim().is_empty() {
            return Err(SdpmError::validation("Embedding model cannot be empty"));
        }

        if self.embedding.batch_size == 0 {
            return Err(SdpmError::validation("Batch size must be greater than 0"));
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty" | "text" | "compact") {
            return Err(SdpmError::validation(format!(
                "Unknown log format: {}",
                self.logging.format
            )));
        }

        Ok(())
    }
}

// Default value functions
fn default_ollama_url() -> Url {
    Url::parse("http://localhost:11434").expect("static URL is valid")
}
fn default_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_timeout() -> u64 {
    300
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_cache_capacity() -> u64 {
    DEFAULT_CACHE_CAPACITY
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
