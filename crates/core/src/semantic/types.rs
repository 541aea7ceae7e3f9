//! Core types for semantic chunking
//!
//! This module defines the fundamental data structures used by the SDPM
//! pipeline: prepared sentences, the sentence groups that the merge passes
//! operate on, and the final chunks handed to callers.

use serde::{Deserialize, Serialize};

/// A prepared sentence with offsets, token count and embedding
///
/// Sentences are produced once per input text by sentence preparation and are
/// read-only afterwards. Offsets are UTF-8 byte offsets into the source text.
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::types::Sentence;
///
/// let text = "Hello world. Goodbye.";
/// let sentence = Sentence::new("Hello world. ".to_string(), 0, 13, 2, vec![0.1, 0.2]);
///
/// assert_eq!(&text[sentence.start_index..sentence.end_index], sentence.text);
/// assert_eq!(sentence.char_count(), 13);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sentence {
    /// Sentence text, including any attached delimiter and whitespace
    pub text: String,

    /// Byte offset of the first character in the source text
    pub start_index: usize,

    /// Byte offset one past the last character in the source text
    pub end_index: usize,

    /// Number of tokens as reported by the configured token counter
    pub token_count: usize,

    /// Precomputed embedding vector
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

impl Sentence {
    /// Creates a new sentence
    pub fn new(
        text: String,
        start_index: usize,
        end_index: usize,
        token_count: usize,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            text,
            start_index,
            end_index,
            token_count,
            embedding,
        }
    }

    /// Number of characters in the sentence
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Flattens grouped lists into one ordered sequence
///
/// Order is preserved: all items of the first group, then all items of the
/// second, and so on.
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::types::merge_sentence_groups;
///
/// let groups = vec![vec!["a", "b"], vec!["c"], vec!["d", "e"]];
/// assert_eq!(merge_sentence_groups(groups), vec!["a", "b", "c", "d", "e"]);
/// ```
pub fn merge_sentence_groups<T, I>(groups: I) -> Vec<T>
where
    I: IntoIterator<Item = Vec<T>>,
{
    itertools::concat(groups)
}

/// An ordered, non-empty run of sentences treated as one merge unit
///
/// Groups are values: merging never mutates a group, it consumes several
/// groups and produces a new one. The aggregate embedding of a group is not
/// stored here; it is computed by a
/// [`GroupEmbedder`](crate::semantic::pooling::GroupEmbedder) whenever it
/// is needed.
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::types::{Sentence, SentenceGroup};
///
/// let a = SentenceGroup::single(Sentence::new("One. ".into(), 0, 5, 1, vec![]));
/// let b = SentenceGroup::single(Sentence::new("Two.".into(), 5, 9, 1, vec![]));
///
/// let merged = SentenceGroup::merge(vec![a, b]);
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged.text(), "One. Two.");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceGroup {
    sentences: Vec<Sentence>,
}

impl SentenceGroup {
    /// Creates a group, returning `None` when `sentences` is empty
    pub fn new(sentences: Vec<Sentence>) -> Option<Self> {
        if sentences.is_empty() {
            None
        } else {
            Some(Self { sentences })
        }
    }

    /// Creates a group holding exactly one sentence
    pub fn single(sentence: Sentence) -> Self {
        Self {
            sentences: vec![sentence],
        }
    }

    /// Concatenates groups, in order, into one new group
    ///
    /// Callers pass at least one group; every group is non-empty, so the
    /// result is non-empty as well.
    pub fn merge<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = SentenceGroup>,
    {
        Self {
            sentences: merge_sentence_groups(groups.into_iter().map(Self::into_sentences)),
        }
    }

    /// Sentences in document order
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Consumes the group and returns its sentences
    pub fn into_sentences(self) -> Vec<Sentence> {
        self.sentences
    }

    /// Number of sentences in the group
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// Always false for a constructed group
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Sum of the sentence token counts
    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.token_count).sum()
    }

    /// Concatenated sentence text
    pub fn text(&self) -> String {
        self.sentences.iter().map(|s| s.text.as_str()).collect()
    }

    /// Start offset of the first sentence
    pub fn start_index(&self) -> usize {
        self.sentences.first().map_or(0, |s| s.start_index)
    }

    /// End offset of the last sentence
    pub fn end_index(&self) -> usize {
        self.sentences.last().map_or(0, |s| s.end_index)
    }
}

/// Represents a semantically coherent, size-bounded chunk of text
///
/// Chunks are the only externally visible output of the chunker. They are
/// built from one merged group (or a slice of one) and never split a
/// sentence.
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::types::{SemanticChunk, Sentence};
///
/// let sentences = vec![
///     Sentence::new("Rust is fast. ".into(), 0, 14, 3, vec![]),
///     Sentence::new("It is also safe.".into(), 14, 30, 4, vec![]),
/// ];
/// let chunk = SemanticChunk::from_sentences(sentences, 0.9);
///
/// assert_eq!(chunk.text, "Rust is fast. It is also safe.");
/// assert_eq!(chunk.token_count, 7);
/// assert_eq!((chunk.start_index, chunk.end_index), (0, 30));
/// assert_eq!(chunk.sentence_count(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticChunk {
    /// The text content of the chunk
    pub text: String,

    /// Index of this chunk within the document (0-based)
    pub chunk_index: usize,

    /// Total number of chunks in the document
    pub total_chunks: usize,

    /// Byte offset of the chunk start in the source text
    pub start_index: usize,

    /// Byte offset one past the chunk end in the source text
    pub end_index: usize,

    /// Total number of tokens across the chunk's sentences
    pub token_count: usize,

    /// Average similarity between consecutive sentences in this chunk
    pub avg_similarity: f32,

    /// Sentences making up the chunk, in document order
    pub sentences: Vec<Sentence>,

    /// Additional metadata about the chunk
    pub metadata: ChunkMetadata,
}

impl SemanticChunk {
    /// Builds a chunk from an ordered run of sentences
    ///
    /// Text is the plain concatenation of the sentence texts; offsets come
    /// from the first and last sentence. `chunk_index` and `total_chunks` are
    /// left at zero for the assembler to fill in.
    pub fn from_sentences(sentences: Vec<Sentence>, avg_similarity: f32) -> Self {
        let text: String = sentences.iter().map(|s| s.text.as_str()).collect();
        let token_count = sentences.iter().map(|s| s.token_count).sum();
        let start_index = sentences.first().map_or(0, |s| s.start_index);
        let end_index = sentences.last().map_or(0, |s| s.end_index);
        let metadata = ChunkMetadata::new("unknown".to_string(), &text);

        Self {
            text,
            chunk_index: 0,
            total_chunks: 0,
            start_index,
            end_index,
            token_count,
            avg_similarity,
            sentences,
            metadata,
        }
    }

    /// Returns the number of sentences in this chunk
    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    /// Replaces the document-level metadata, keeping this chunk's own counts
    pub fn apply_metadata(&mut self, document: &ChunkMetadata) {
        self.metadata = ChunkMetadata {
            source_file: document.source_file.clone(),
            title: document.title.clone(),
            word_count: self.metadata.word_count,
            char_count: self.metadata.char_count,
        };
    }

    /// Drops the per-sentence embeddings, e.g. before serializing for display
    pub fn strip_embeddings(&mut self) {
        for sentence in &mut self.sentences {
            sentence.embedding.clear();
        }
    }
}

/// Metadata associated with a semantic chunk
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::types::ChunkMetadata;
///
/// let metadata = ChunkMetadata::new(
///     "docs/example.md".to_string(),
///     "Hello world, this is a test.",
/// );
///
/// assert_eq!(metadata.source_file, "docs/example.md");
/// assert_eq!(metadata.word_count, 6);
/// assert!(metadata.char_count > 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// Path to the source file this chunk originated from
    pub source_file: String,

    /// Optional title of the document or section
    pub title: Option<String>,

    /// Number of words in the chunk
    pub word_count: usize,

    /// Number of characters in the chunk
    pub char_count: usize,
}

impl ChunkMetadata {
    /// Creates metadata, deriving word and character counts from `content`
    pub fn new(source_file: String, content: &str) -> Self {
        Self {
            source_file,
            title: None,
            word_count: content.split_whitespace().count(),
            char_count: content.chars().count(),
        }
    }

    /// Sets the title
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }
}
