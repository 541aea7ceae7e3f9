//! Size-bounded chunk assembly
//!
//! Turns merged sentence groups into [`SemanticChunk`]s no larger than the
//! configured token budget. Sentences are never broken and chunks never
//! span two groups.

use super::similarity::{pairwise_similarities, SimilarityMeasure};
use super::types::{SemanticChunk, Sentence, SentenceGroup};
use tracing::{debug, warn};

/// Default maximum tokens per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Default minimum sentences per chunk
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 2;

#[derive(Debug, Default)]
struct Piece {
    sentences: Vec<Sentence>,
    tokens: usize,
}

impl Piece {
    fn push(&mut self, sentence: Sentence) {
        self.tokens += sentence.token_count;
        self.sentences.push(sentence);
    }
}

/// Packs sentence groups into chunks
///
/// Within a group, sentences are packed greedily up to `chunk_size` tokens.
/// A sentence that alone exceeds `chunk_size` becomes a chunk of its own.
/// When the last chunk of a group ends up with fewer than `min_chunk_size`
/// sentences, trailing sentences of the chunk before it are moved over while
/// the tail stays within `chunk_size` and the earlier chunk keeps at least
/// `min_chunk_size` sentences.
pub struct ChunkAssembler<'a> {
    chunk_size: usize,
    min_chunk_size: usize,
    measure: &'a dyn SimilarityMeasure,
}

impl<'a> ChunkAssembler<'a> {
    pub fn new(
        chunk_size: usize,
        min_chunk_size: usize,
        measure: &'a dyn SimilarityMeasure,
    ) -> Self {
        Self {
            chunk_size,
            min_chunk_size,
            measure,
        }
    }

    /// Builds the final, indexed chunk list
    pub fn assemble(&self, groups: Vec<SentenceGroup>) -> Vec<SemanticChunk> {
        let group_count = groups.len();
        let mut chunks: Vec<SemanticChunk> = groups
            .into_iter()
            .flat_map(|group| self.split_group(group))
            .map(|piece| self.build_chunk(piece.sentences))
            .collect();

        let total_chunks = chunks.len();
        for (index, chunk) in chunks.iter_mut().enumerate() {
            chunk.chunk_index = index;
            chunk.total_chunks = total_chunks;
        }

        debug!(
            "Assembled {} chunks from {} groups (chunk_size {})",
            total_chunks, group_count, self.chunk_size
        );

        chunks
    }

    /// Builds a single chunk from all `sentences`, ignoring the size limit
    pub fn single_chunk(&self, sentences: Vec<Sentence>) -> SemanticChunk {
        let mut chunk = self.build_chunk(sentences);
        chunk.total_chunks = 1;
        chunk
    }

    fn split_group(&self, group: SentenceGroup) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut current = Piece::default();

        for sentence in group.into_sentences() {
            let overflows = current.tokens + sentence.token_count > self.chunk_size;
            if overflows && !current.sentences.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            if sentence.token_count > self.chunk_size {
                warn!(
                    "Sentence at byte {} has {} tokens, exceeding chunk size {}",
                    sentence.start_index, sentence.token_count, self.chunk_size
                );
            }
            current.push(sentence);
        }

        if !current.sentences.is_empty() {
            pieces.push(current);
        }

        self.rebalance_tail(&mut pieces);
        pieces
    }

    fn rebalance_tail(&self, pieces: &mut [Piece]) {
        let [.., previous, tail] = pieces else {
            return;
        };

        while tail.sentences.len() < self.min_chunk_size
            && previous.sentences.len() > self.min_chunk_size
        {
            let Some(last) = previous.sentences.last() else {
                break;
            };
            if tail.tokens + last.token_count > self.chunk_size {
                break;
            }
            let Some(moved) = previous.sentences.pop() else {
                break;
            };
            previous.tokens -= moved.token_count;
            tail.tokens += moved.token_count;
            tail.sentences.insert(0, moved);
        }
    }

    fn build_chunk(&self, sentences: Vec<Sentence>) -> SemanticChunk {
        let avg_similarity = self.average_similarity(&sentences);
        SemanticChunk::from_sentences(sentences, avg_similarity)
    }

    /// Mean similarity between consecutive sentences; 1.0 for a single sentence
    fn average_similarity(&self, sentences: &[Sentence]) -> f32 {
        if sentences.len() <= 1 {
            return 1.0;
        }

        let embeddings: Vec<Vec<f32>> = sentences.iter().map(|s| s.embedding.clone()).collect();
        let similarities = pairwise_similarities(self.measure, &embeddings);

        similarities.iter().sum::<f32>() / similarities.len() as f32
    }
}
