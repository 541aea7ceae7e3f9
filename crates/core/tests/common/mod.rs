//! Common test helpers for chunking integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use sdpm_core::semantic::embeddings::{EmbeddingError, EmbeddingProvider};
use sdpm_core::semantic::types::{Sentence, SentenceGroup};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Keyword lists, one per embedding dimension
pub const TOPICS: &[&[&str]] = &[
    &["rust", "cargo", "borrow", "compiler", "crate"],
    &["garden", "tomato", "soil", "water", "seeds"],
    &["ocean", "tide", "wave", "coral", "reef"],
];

/// Deterministic provider that embeds a text by counting topic keywords
///
/// Every vector also carries a small constant component so that texts
/// without any keyword still have a non-zero embedding.
#[derive(Debug, Default)]
pub struct TopicProvider {
    calls: AtomicUsize,
}

impl TopicProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `embed` calls served
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = TOPICS
            .iter()
            .map(|words| words.iter().filter(|w| lower.contains(*w)).count() as f32)
            .collect();
        vector.push(0.05);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for TopicProvider {
    fn model_name(&self) -> &str {
        "topic-keywords"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }
        Ok(Self::vector(text))
    }
}

/// Small linear congruential generator for reproducible inputs
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    /// Uniform value in `[0, 1)`
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() % 1_000_000) as f32 / 1_000_000.0
    }

    pub fn next_below(&mut self, bound: usize) -> usize {
        self.next_u32() as usize % bound.max(1)
    }
}

/// Builds a sentence whose text and offsets are derived from its id
pub fn sentence(id: usize, embedding: Vec<f32>) -> Sentence {
    let text = format!("s{:04} ", id);
    let start = id * text.len();
    let end = start + text.len();
    Sentence::new(text, start, end, 1, embedding)
}

/// Random groups of one to three sentences with `dim`-dimensional embeddings
pub fn random_groups(rng: &mut Lcg, count: usize, dim: usize) -> Vec<SentenceGroup> {
    let mut next_id = 0;
    (0..count)
        .map(|_| {
            let size = 1 + rng.next_below(3);
            let sentences = (0..size)
                .map(|_| {
                    let embedding = (0..dim).map(|_| rng.next_f32() - 0.3).collect();
                    next_id += 1;
                    sentence(next_id - 1, embedding)
                })
                .collect();
            SentenceGroup::new(sentences).expect("group sizes are at least 1")
        })
        .collect()
}

/// One single-sentence group per topic index, with one-hot embeddings
pub fn topic_groups(topics: &[usize], dim: usize) -> Vec<SentenceGroup> {
    topics
        .iter()
        .enumerate()
        .map(|(id, &topic)| {
            let mut embedding = vec![0.0; dim];
            embedding[topic] = 1.0;
            SentenceGroup::single(sentence(id, embedding))
        })
        .collect()
}

/// All sentences of `groups`, in order
pub fn flatten(groups: &[SentenceGroup]) -> Vec<Sentence> {
    groups
        .iter()
        .flat_map(|g| g.sentences().iter().cloned())
        .collect()
}
