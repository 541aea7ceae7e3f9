//! Ollama client implementation for embedding generation

use crate::error::{Result, SdpmError};
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default request timeout for the Ollama API
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Ollama client for interacting with the Ollama API
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a new Ollama client with the default timeout
    pub fn new(base_url: String) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with custom timeout
    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| SdpmError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL of the Ollama server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama server is accessible
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);

        debug!("Fetching models from: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SdpmError::network(format!("Failed to fetch models: {}", e)))?;

        if !response.status().is_success() {
            return Err(SdpmError::ai(format!(
                "Failed to list models: HTTP {}",
                response.status()
            )));
        }

        let models_response: ModelsResponse = response
            .json()
            .await
            .map_err(|e| SdpmError::ai(format!("Failed to parse models response: {}", e)))?;

        Ok(models_response.models)
    }

    /// Check if a specific model is available
    pub async fn has_model(&self, model_name: &str) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|m| m.name == model_name || m.name.split(':').next() == Some(model_name)))
    }

    /// Fail with [`SdpmError::ModelNotAvailable`] unless the model is installed
    pub async fn ensure_model(&self, model_name: &str) -> Result<()> {
        if self.has_model(model_name).await? {
            info!("Embedding model available: {}", model_name);
            Ok(())
        } else {
            Err(SdpmError::model_not_available(model_name))
        }
    }

    /// Generate embeddings for text
    pub async fn embed(&self, request: EmbedRequest) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        debug!("Generating embeddings with model: {}", request.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SdpmError::network(format!("Failed to send embed request: {}", e)))?;

        if !response.status().is_success() {
            return Err(SdpmError::ai(format!(
                "Embed request failed: HTTP {}",
                response.status()
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| SdpmError::ai(format!("Failed to parse embed response: {}", e)))?;

        if embed_response.embedding.is_empty() {
            return Err(SdpmError::ai("Embed response contained an empty vector"));
        }

        Ok(embed_response.embedding)
    }
}

/// Information about an available model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub modified_at: String,
}

/// Response from the models list endpoint
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Request for embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub model: String,
    pub prompt: String,
}

/// Response from embeddings
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}
