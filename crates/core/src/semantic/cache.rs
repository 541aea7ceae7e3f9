//! Sentence embedding cache
//!
//! Wraps any [`EmbeddingProvider`] so that repeated sentences, common in
//! boilerplate-heavy documents and across a batch of documents, are embedded
//! once. Entries are evicted by capacity and by a one hour time-to-live.
//!
//! # Examples
//!
//! ```rust
//! use sdpm_core::semantic::cache::CachedEmbeddings;
//! use sdpm_core::semantic::embeddings::OllamaEmbeddings;
//! use sdpm_core::ai::OllamaClient;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new("http://localhost:11434".to_string())?;
//! let provider = CachedEmbeddings::new(OllamaEmbeddings::new(client, "nomic-embed-text"), 1000);
//! # Ok(())
//! # }
//! ```

use super::embeddings::{check_dimension, EmbeddingError, EmbeddingProvider};
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Default number of cached embeddings
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Embedding provider decorator with an in-memory cache
#[derive(Clone)]
pub struct CachedEmbeddings<P> {
    inner: P,
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl<P: EmbeddingProvider> CachedEmbeddings<P> {
    /// Wrap `inner` with a cache holding at most `capacity` embeddings
    pub fn new(inner: P, capacity: u64) -> Self {
        Self::with_ttl(inner, capacity, 3600)
    }

    /// Wrap `inner` with a custom time-to-live in seconds
    pub fn with_ttl(inner: P, capacity: u64, ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();

        debug!(
            "Created sentence embedding cache with capacity {}, TTL {}s",
            capacity, ttl_seconds
        );

        Self { inner, cache }
    }

    /// Wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of cached embeddings
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Drop every cached embedding
    pub async fn clear(&self) {
        debug!("Clearing sentence embedding cache");
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Flush moka's pending maintenance so counts are exact
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbeddings<P> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(cached) = self.cache.get(text).await {
            trace!("Embedding cache HIT ({} bytes)", text.len());
            return Ok(cached.as_ref().clone());
        }

        trace!("Embedding cache MISS ({} bytes)", text.len());
        let embedding = self.inner.embed(text).await?;
        self.cache
            .insert(text.to_string(), Arc::new(embedding.clone()))
            .await;
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut slots: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();
        let mut missing_positions = Vec::new();

        for (position, text) in texts.iter().enumerate() {
            match self.cache.get(text.as_str()).await {
                Some(cached) => slots.push(Some(cached.as_ref().clone())),
                None => {
                    slots.push(None);
                    missing.push(text.clone());
                    missing_positions.push(position);
                }
            }
        }

        debug!(
            "Embedding cache served {}/{} texts",
            texts.len() - missing.len(),
            texts.len()
        );

        if !missing.is_empty() {
            let computed = self.inner.embed_batch(&missing).await?;
            if computed.len() != missing.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: missing.len(),
                    actual: computed.len(),
                });
            }

            for ((position, text), embedding) in
                missing_positions.into_iter().zip(missing).zip(computed)
            {
                self.cache.insert(text, Arc::new(embedding.clone())).await;
                slots[position] = Some(embedding);
            }
        }

        let mut expected_dimension = None;
        let mut embeddings = Vec::with_capacity(slots.len());
        for embedding in slots.into_iter().flatten() {
            check_dimension(&mut expected_dimension, embedding.len())?;
            embeddings.push(embedding);
        }

        Ok(embeddings)
    }
}
