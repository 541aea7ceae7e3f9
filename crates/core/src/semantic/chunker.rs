//! Semantic Double-Pass Merging chunker
//!
//! This module ties the pipeline together and exposes the public chunking
//! entry points.
//!
//! # Architecture
//!
//! The chunking process involves:
//! 1. Split the document into sentences (preserving code blocks)
//! 2. Count tokens and generate an embedding for each sentence
//! 3. Calibrate the similarity threshold for this document
//! 4. First pass: group adjacent similar sentences
//! 5. Second pass: skip-merge groups separated by short digressions
//! 6. Pack the merged groups into size-bounded chunks
//!
//! Only step 2 talks to the embedding provider; every later step is
//! synchronous and deterministic.
//!
//! # Examples
//!
//! ```no_run
//! use sdpm_core::ai::OllamaClient;
//! use sdpm_core::semantic::chunker::{ChunkerConfig, SdpmChunker};
//! use sdpm_core::semantic::embeddings::OllamaEmbeddings;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new("http://localhost:11434".to_string())?;
//! let provider = Arc::new(OllamaEmbeddings::new(client, "nomic-embed-text"));
//! let chunker = SdpmChunker::new(ChunkerConfig::technical_docs(), provider)?;
//!
//! let text = "First paragraph about topic A. More on topic A.
//!             New paragraph about topic B. Continues topic B.";
//! let chunks = chunker.chunk(text).await?;
//!
//! for chunk in chunks {
//!     println!("Chunk {}: {} sentences", chunk.chunk_index, chunk.sentence_count());
//! }
//! # Ok(())
//! # }
//! ```

use super::assembly::{ChunkAssembler, DEFAULT_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE};
use super::embeddings::{EmbeddingError, EmbeddingProvider};
use super::grouping::{window_similarities, FirstPassGrouper, GroupingMode};
use super::merge::{SkipMerger, DEFAULT_SKIP_WINDOW};
use super::pooling::{GroupEmbedder, PoolingStrategy};
use super::similarity::{CosineSimilarity, SimilarityError, SimilarityMeasure};
use super::splitter::{
    IncludeDelim, SentenceSplitter, DEFAULT_DELIMITERS, DEFAULT_MIN_CHARACTERS_PER_SENTENCE,
};
use super::threshold::{Threshold, ThresholdCalibrator};
use super::tokenizer::{TokenCounter, TokenCounterKind};
use super::types::{ChunkMetadata, SemanticChunk, Sentence};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration for SDPM chunking behavior
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::chunker::ChunkerConfig;
/// use sdpm_core::semantic::threshold::Threshold;
///
/// // Use default configuration
/// let config = ChunkerConfig::default();
/// assert_eq!(config.skip_window, 1);
/// assert_eq!(config.chunk_size, 512);
///
/// // Custom configuration
/// let custom = ChunkerConfig {
///     threshold: Threshold::Fixed(0.8),
///     skip_window: 2,
///     ..Default::default()
/// };
/// assert!(custom.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkerConfig {
    /// First-pass grouping mode
    pub mode: GroupingMode,

    /// Similarity threshold: `auto`, fixed value or percentile
    pub threshold: Threshold,

    /// Maximum tokens per chunk
    pub chunk_size: usize,

    /// Number of preceding sentences compared with each sentence
    pub similarity_window: usize,

    /// Minimum sentences per first-pass group; documents with at most this
    /// many sentences become a single chunk
    pub min_sentences: usize,

    /// Minimum sentences per chunk, used by threshold search and tail balancing
    pub min_chunk_size: usize,

    /// Sentence pieces shorter than this many characters are combined
    pub min_characters_per_sentence: usize,

    /// Convergence step for the auto threshold search
    pub threshold_step: f32,

    /// Sentence delimiters
    pub delimiters: Vec<String>,

    /// Where delimiters are attached
    pub include_delim: IncludeDelim,

    /// How many groups the second pass may look past
    pub skip_window: usize,

    /// Group embedding policy
    pub pooling: PoolingStrategy,

    /// Token counting policy
    pub token_counter: TokenCounterKind,

    /// Never split inside Markdown code
    pub protect_code_blocks: bool,

    /// Never split on the period of a known abbreviation
    pub protect_abbreviations: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            mode: GroupingMode::default(),
            threshold: Threshold::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            similarity_window: 1,
            min_sentences: 1,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            min_characters_per_sentence: DEFAULT_MIN_CHARACTERS_PER_SENTENCE,
            threshold_step: 0.01,
            delimiters: DEFAULT_DELIMITERS.iter().map(|d| d.to_string()).collect(),
            include_delim: IncludeDelim::default(),
            skip_window: DEFAULT_SKIP_WINDOW,
            pooling: PoolingStrategy::default(),
            token_counter: TokenCounterKind::default(),
            protect_code_blocks: true,
            protect_abbreviations: true,
        }
    }
}

impl ChunkerConfig {
    /// Preset configuration optimized for technical documentation
    ///
    /// Allows larger chunks and a wider skip window, since code samples and
    /// tables often interrupt a single topic.
    ///
    /// # Examples
    ///
    /// ```
    /// use sdpm_core::semantic::chunker::ChunkerConfig;
    ///
    /// let config = ChunkerConfig::technical_docs();
    /// assert_eq!(config.chunk_size, 768);
    /// assert_eq!(config.skip_window, 2);
    /// ```
    pub fn technical_docs() -> Self {
        Self {
            chunk_size: 768,
            skip_window: 2,
            min_chunk_size: 3,
            ..Default::default()
        }
    }

    /// Preset configuration optimized for narrative text
    ///
    /// Uses smaller chunks and compares each sentence with a wider window of
    /// preceding sentences to follow the narrative flow.
    ///
    /// # Examples
    ///
    /// ```
    /// use sdpm_core::semantic::chunker::ChunkerConfig;
    ///
    /// let config = ChunkerConfig::narrative();
    /// assert_eq!(config.chunk_size, 384);
    /// assert_eq!(config.similarity_window, 3);
    /// ```
    pub fn narrative() -> Self {
        Self {
            chunk_size: 384,
            similarity_window: 3,
            protect_code_blocks: false,
            ..Default::default()
        }
    }

    /// Validates configuration parameters
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::InvalidConfiguration`] if any parameter is invalid:
    /// - threshold out of range for its kind
    /// - chunk_size, similarity_window, min_sentences, min_chunk_size or
    ///   min_characters_per_sentence is 0
    /// - threshold_step not in (0.0, 1.0)
    /// - delimiters empty, or containing an empty delimiter
    pub fn validate(&self) -> Result<(), ChunkingError> {
        self.threshold
            .validate()
            .map_err(ChunkingError::InvalidConfiguration)?;

        let positive = [
            ("chunk_size", self.chunk_size),
            ("similarity_window", self.similarity_window),
            ("min_sentences", self.min_sentences),
            ("min_chunk_size", self.min_chunk_size),
            ("min_characters_per_sentence", self.min_characters_per_sentence),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ChunkingError::InvalidConfiguration(format!(
                "{} must be greater than 0",
                name
            )));
        }

        if !(self.threshold_step > 0.0 && self.threshold_step < 1.0) {
            return Err(ChunkingError::InvalidConfiguration(format!(
                "threshold_step must be between 0.0 and 1.0 (exclusive), got {}",
                self.threshold_step
            )));
        }

        if self.delimiters.is_empty() {
            return Err(ChunkingError::InvalidConfiguration(
                "delimiters cannot be empty".to_string(),
            ));
        }

        if self.delimiters.iter().any(String::is_empty) {
            return Err(ChunkingError::InvalidConfiguration(
                "delimiters cannot contain an empty string".to_string(),
            ));
        }

        Ok(())
    }

    /// Sentence splitter described by this configuration
    pub fn splitter(&self) -> SentenceSplitter {
        SentenceSplitter::new(self.min_characters_per_sentence)
            .with_delimiters(self.delimiters.iter().cloned())
            .with_include_delim(self.include_delim)
            .with_code_block_protection(self.protect_code_blocks)
            .with_abbreviation_protection(self.protect_abbreviations)
    }
}

/// Chunker implementing Semantic Double-Pass Merging
///
/// A chunker holds no per-document state, so one instance can process any
/// number of documents. Documents are always processed one at a time.
pub struct SdpmChunker {
    config: ChunkerConfig,
    provider: Arc<dyn EmbeddingProvider>,
    splitter: SentenceSplitter,
    token_counter: Box<dyn TokenCounter>,
    measure: Box<dyn SimilarityMeasure>,
    embedder: Box<dyn GroupEmbedder>,
}

impl SdpmChunker {
    /// Creates a chunker, rejecting invalid configuration up front
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::InvalidConfiguration`] when
    /// [`ChunkerConfig::validate`] fails
    pub fn new(
        config: ChunkerConfig,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, ChunkingError> {
        config.validate()?;

        Ok(Self {
            splitter: config.splitter(),
            token_counter: config.token_counter.counter(),
            measure: Box::new(CosineSimilarity),
            embedder: config.pooling.embedder(),
            config,
            provider,
        })
    }

    /// Replaces the token counter
    pub fn with_token_counter(mut self, token_counter: Box<dyn TokenCounter>) -> Self {
        self.token_counter = token_counter;
        self
    }

    /// Replaces the similarity measure
    pub fn with_similarity_measure(mut self, measure: Box<dyn SimilarityMeasure>) -> Self {
        self.measure = measure;
        self
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunks `text` into semantically coherent, size-bounded chunks
    ///
    /// Empty or whitespace-only input yields no chunks. A text with at most
    /// `min_sentences` sentences yields exactly one chunk.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::EmbeddingGeneration`] if the provider fails;
    /// no partial result is returned in that case.
    pub async fn chunk(&self, text: &str) -> Result<Vec<SemanticChunk>, ChunkingError> {
        if text.trim().is_empty() {
            debug!("Skipping empty document");
            return Ok(Vec::new());
        }

        let sentences = self.prepare_sentences(text).await?;
        self.chunk_sentences(sentences)
    }

    /// Chunks `text` and returns only the chunk texts
    pub async fn chunk_texts(&self, text: &str) -> Result<Vec<String>, ChunkingError> {
        Ok(self
            .chunk(text)
            .await?
            .into_iter()
            .map(|chunk| chunk.text)
            .collect())
    }

    /// Chunks several documents, strictly one after another
    pub async fn chunk_batch<I, S>(
        &self,
        texts: I,
    ) -> Result<Vec<Vec<SemanticChunk>>, ChunkingError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = Vec::new();
        for (index, text) in texts.into_iter().enumerate() {
            debug!("Chunking batch document {}", index);
            results.push(self.chunk(text.as_ref()).await?);
        }
        Ok(results)
    }

    /// Chunks a document and attaches `metadata` to every chunk
    ///
    /// Each chunk keeps its own word and character counts; only the source
    /// file and title are taken from `metadata`.
    pub async fn chunk_document(
        &self,
        text: &str,
        metadata: Option<ChunkMetadata>,
    ) -> Result<Vec<SemanticChunk>, ChunkingError> {
        let mut chunks = self.chunk(text).await?;

        if let Some(metadata) = metadata {
            for chunk in &mut chunks {
                chunk.apply_metadata(&metadata);
            }
            info!(
                "Created {} semantic chunks for {}",
                chunks.len(),
                metadata.source_file
            );
        }

        Ok(chunks)
    }

    /// Splits `text` into sentences with token counts and embeddings
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::EmbeddingGeneration`] if the provider fails
    /// or returns the wrong number of vectors
    pub async fn prepare_sentences(&self, text: &str) -> Result<Vec<Sentence>, ChunkingError> {
        let spans = self.splitter.split(text);
        if spans.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = spans.iter().map(|span| span.text.clone()).collect();
        let embeddings = self.provider.embed_batch(&texts).await?;

        if embeddings.len() != spans.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: spans.len(),
                actual: embeddings.len(),
            }
            .into());
        }

        debug!(
            "Prepared {} sentences with {} embeddings",
            spans.len(),
            self.provider.model_name()
        );

        Ok(spans
            .into_iter()
            .zip(embeddings)
            .map(|(span, embedding)| {
                let token_count = self.token_counter.count_tokens(&span.text);
                Sentence::new(span.text, span.start, span.end, token_count, embedding)
            })
            .collect())
    }

    /// Runs calibration, both merge passes and assembly over prepared sentences
    ///
    /// This is the synchronous part of [`SdpmChunker::chunk`].
    pub fn chunk_sentences(
        &self,
        sentences: Vec<Sentence>,
    ) -> Result<Vec<SemanticChunk>, ChunkingError> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let assembler = ChunkAssembler::new(
            self.config.chunk_size,
            self.config.min_chunk_size,
            self.measure.as_ref(),
        );

        if sentences.len() <= self.config.min_sentences {
            debug!(
                "{} sentences at or below min_sentences, emitting a single chunk",
                sentences.len()
            );
            return Ok(vec![assembler.single_chunk(sentences)]);
        }

        let sentence_count = sentences.len();
        let similarities = window_similarities(
            &sentences,
            self.config.similarity_window,
            self.measure.as_ref(),
            self.embedder.as_ref(),
        );

        let calibrator = ThresholdCalibrator {
            chunk_size: self.config.chunk_size,
            min_chunk_size: self.config.min_chunk_size,
            min_sentences: self.config.min_sentences,
            threshold_step: self.config.threshold_step,
        };
        let threshold = calibrator.calibrate(self.config.threshold, &sentences, &similarities)?;

        let grouper = FirstPassGrouper::new(
            self.measure.as_ref(),
            self.embedder.as_ref(),
            self.config.mode,
            self.config.min_sentences,
        );
        let groups = grouper.group(sentences, threshold, &similarities);
        let first_pass_groups = groups.len();

        let merger = SkipMerger::new(
            self.config.skip_window,
            self.measure.as_ref(),
            self.embedder.as_ref(),
        );
        let merged = merger.merge(groups, threshold);
        let merged_groups = merged.len();

        let chunks = assembler.assemble(merged);

        info!(
            "Chunked {} sentences into {} chunks ({} groups after first pass, {} after skip merge, threshold {:.4})",
            sentence_count,
            chunks.len(),
            first_pass_groups,
            merged_groups,
            threshold
        );

        Ok(chunks)
    }
}

impl fmt::Debug for SdpmChunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdpmChunker")
            .field("model", &self.provider.model_name())
            .field("config", &self.config)
            .finish()
    }
}

/// Errors that can occur during semantic chunking
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Failed to generate embeddings for sentences
    #[error("Embedding generation failed: {0}")]
    EmbeddingGeneration(#[from] EmbeddingError),

    /// Failed to calculate similarity between sentences
    #[error("Similarity calculation failed: {0}")]
    SimilarityCalculation(#[from] SimilarityError),

    /// Invalid configuration parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
