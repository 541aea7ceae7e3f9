//! Semantic chunking module for intelligent text segmentation
//!
//! This module implements Semantic Double-Pass Merging (SDPM): documents are
//! split into sentences, adjacent similar sentences are grouped, groups that
//! belong to the same topic but were separated by a short digression are
//! merged, and the result is packed into size-bounded chunks.
//!
//! # Components
//!
//! - [`types`] - Core data structures (Sentence, SentenceGroup, SemanticChunk)
//! - [`splitter`] - Sentence splitting with code preservation
//! - [`tokenizer`] - Token counting
//! - [`embeddings`] / [`cache`] - Sentence embedding providers
//! - [`pooling`] - Group embeddings
//! - [`similarity`] - Similarity measure and statistics
//! - [`threshold`] - Threshold calibration
//! - [`grouping`] - First pass
//! - [`merge`] - Second pass (skip merge)
//! - [`assembly`] - Size-bounded chunk assembly
//! - [`chunker`] - The [`SdpmChunker`] entry point
//!
//! # Examples
//!
//! ```
//! use sdpm_core::semantic::{splitter::SentenceSplitter, types::ChunkMetadata};
//!
//! // Split text into sentences
//! let splitter = SentenceSplitter::new(10);
//! let text = "First sentence. Second sentence. Third sentence.";
//! let sentences = splitter.split(text);
//!
//! assert_eq!(sentences.len(), 3);
//!
//! // Create chunk metadata
//! let metadata = ChunkMetadata::new(
//!     "docs/guide.md".to_string(),
//!     "Example content for documentation",
//! );
//!
//! assert!(metadata.word_count > 0);
//! ```

pub mod assembly;
pub mod cache;
pub mod chunker;
pub mod embeddings;
pub mod grouping;
pub mod merge;
pub mod pooling;
pub mod similarity;
pub mod splitter;
pub mod threshold;
pub mod tokenizer;
pub mod types;

// Re-export commonly used types
pub use assembly::ChunkAssembler;
pub use cache::CachedEmbeddings;
pub use chunker::{ChunkerConfig, ChunkingError, SdpmChunker};
pub use embeddings::{generate_embeddings_batch, EmbeddingError, EmbeddingProvider, OllamaEmbeddings};
pub use grouping::{FirstPassGrouper, GroupingMode};
pub use merge::SkipMerger;
pub use pooling::{GroupEmbedder, MeanPooling, PoolingStrategy, TokenWeightedPooling};
pub use similarity::{
    calculate_percentile, cosine_similarity, pairwise_similarities, CosineSimilarity,
    SimilarityError, SimilarityMeasure,
};
pub use splitter::{IncludeDelim, SentenceSplitter};
pub use threshold::Threshold;
pub use tokenizer::{CharacterTokenCounter, TokenCounter, TokenCounterKind, WordTokenCounter};
pub use types::{merge_sentence_groups, ChunkMetadata, SemanticChunk, Sentence, SentenceGroup};
