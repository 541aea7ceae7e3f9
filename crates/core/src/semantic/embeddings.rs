//! Embedding generation for semantic chunking
//!
//! This module defines the [`EmbeddingProvider`] seam through which the
//! chunker obtains sentence embeddings, the batch helper that enforces a
//! consistent dimension, and the Ollama-backed provider.

use crate::ai::client::{EmbedRequest, OllamaClient};
use crate::error::SdpmError;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Default number of texts per embedding batch
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Failed to generate embeddings from Ollama
    #[error("Failed to generate embeddings: {0}")]
    OllamaError(String),

    /// Empty text provided for embedding
    #[error("Cannot generate embedding for empty text")]
    EmptyText,

    /// Embedding dimension mismatch
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Provider returned a different number of vectors than requested
    #[error("Embedding count mismatch: requested {expected}, received {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// Invalid model specified
    #[error("Invalid model specified: {0}")]
    InvalidModel(String),
}

impl From<SdpmError> for EmbeddingError {
    fn from(error: SdpmError) -> Self {
        match error {
            SdpmError::ModelNotAvailable { model } => EmbeddingError::InvalidModel(model),
            other => EmbeddingError::OllamaError(other.to_string()),
        }
    }
}

/// Source of fixed-dimension embedding vectors for text
///
/// A failure from the provider is fatal for the chunking call that needed
/// it; the chunker has no fallback embedding.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name of the underlying model, for logging
    fn model_name(&self) -> &str;

    /// Embeds a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds many texts, returning one vector per text in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        generate_embeddings_batch(self, texts, DEFAULT_BATCH_SIZE).await
    }
}

/// Generates embeddings for multiple texts in batches
///
/// Texts are sent one at a time through [`EmbeddingProvider::embed`], grouped
/// into batches of `batch_size` for progress logging. Every vector must have
/// the same dimension as the first one.
///
/// # Errors
///
/// Returns the first provider error, or `EmbeddingError::DimensionMismatch`
/// when the provider changes dimension mid-stream
pub async fn generate_embeddings_batch<P>(
    provider: &P,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError>
where
    P: EmbeddingProvider + ?Sized,
{
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = batch_size.max(1);
    debug!(
        "Generating embeddings for {} texts in batches of {}",
        texts.len(),
        batch_size
    );

    let mut all_embeddings = Vec::with_capacity(texts.len());
    let mut expected_dimension: Option<usize> = None;

    for (batch_idx, chunk) in texts.chunks(batch_size).enumerate() {
        debug!(
            "Processing batch {}/{} ({} texts)",
            batch_idx + 1,
            texts.len().div_ceil(batch_size),
            chunk.len()
        );

        for text in chunk {
            let embedding = provider.embed(text).await.map_err(|e| {
                warn!("Failed to generate embedding for text: {}", e);
                e
            })?;
            check_dimension(&mut expected_dimension, embedding.len())?;
            all_embeddings.push(embedding);
        }
    }

    debug!(
        "Generated {} embeddings with dimension {}",
        all_embeddings.len(),
        expected_dimension.unwrap_or(0)
    );

    Ok(all_embeddings)
}

/// Records the first dimension seen and rejects any later deviation
pub(crate) fn check_dimension(
    expected: &mut Option<usize>,
    actual: usize,
) -> Result<(), EmbeddingError> {
    match *expected {
        Some(expected) if expected != actual => {
            Err(EmbeddingError::DimensionMismatch { expected, actual })
        }
        Some(_) => Ok(()),
        None => {
            *expected = Some(actual);
            Ok(())
        }
    }
}

/// Embedding provider backed by an Ollama server
///
/// # Examples
///
/// ```no_run
/// use sdpm_core::ai::OllamaClient;
/// use sdpm_core::semantic::embeddings::{EmbeddingProvider, OllamaEmbeddings};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = OllamaClient::new("http://localhost:11434".to_string())?;
/// let provider = OllamaEmbeddings::new(client, "nomic-embed-text");
/// let embedding = provider.embed("This is a sample sentence.").await?;
/// assert!(!embedding.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OllamaEmbeddings {
    client: OllamaClient,
    model: String,
    batch_size: usize,
}

impl OllamaEmbeddings {
    /// Creates a provider for `model` on the given client
    pub fn new<S: Into<String>>(client: OllamaClient, model: S) -> Self {
        Self {
            client,
            model: model.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the batch size used by [`EmbeddingProvider::embed_batch`]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Underlying client
    pub fn client(&self) -> &OllamaClient {
        &self.client
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        debug!("Generating embedding for text of length {}", text.len());

        let request = EmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let embedding = self.client.embed(request).await?;

        debug!("Generated embedding with dimension {}", embedding.len());

        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        generate_embeddings_batch(self, texts, self.batch_size).await
    }
}
