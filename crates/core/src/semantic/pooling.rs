//! Group embedding policies
//!
//! A group of sentences is compared to its neighbours through a single
//! aggregate vector. The aggregate is always derived from the member
//! sentences' embeddings, never by re-embedding the joined text, so merging
//! groups needs no further calls to the embedding provider.

use super::types::Sentence;
use serde::{Deserialize, Serialize};

/// Computes the aggregate embedding of a run of sentences
///
/// The result must depend only on the sentences passed in, and a single
/// sentence must map to a vector pointing the same way as its own embedding.
pub trait GroupEmbedder: Send + Sync {
    /// Aggregate embedding of `sentences`; empty input yields an empty vector
    fn embed_group(&self, sentences: &[Sentence]) -> Vec<f32>;
}

/// Unweighted mean of the sentence embeddings
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanPooling;

impl GroupEmbedder for MeanPooling {
    fn embed_group(&self, sentences: &[Sentence]) -> Vec<f32> {
        weighted_mean(sentences, |_| 1.0)
    }
}

/// Mean of the sentence embeddings weighted by token count
///
/// Longer sentences pull the group vector further toward themselves. If every
/// sentence reports zero tokens this falls back to the plain mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenWeightedPooling;

impl GroupEmbedder for TokenWeightedPooling {
    fn embed_group(&self, sentences: &[Sentence]) -> Vec<f32> {
        if sentences.iter().all(|s| s.token_count == 0) {
            return MeanPooling.embed_group(sentences);
        }
        weighted_mean(sentences, |s| s.token_count as f32)
    }
}

/// Selects the group embedding policy from configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PoolingStrategy {
    /// [`MeanPooling`]
    Mean,
    /// [`TokenWeightedPooling`]
    #[default]
    TokenWeighted,
}

impl PoolingStrategy {
    /// Instantiate the matching embedder
    pub fn embedder(self) -> Box<dyn GroupEmbedder> {
        match self {
            PoolingStrategy::Mean => Box::new(MeanPooling),
            PoolingStrategy::TokenWeighted => Box::new(TokenWeightedPooling),
        }
    }
}

fn weighted_mean<F>(sentences: &[Sentence], weight: F) -> Vec<f32>
where
    F: Fn(&Sentence) -> f32,
{
    let Some(first) = sentences.first() else {
        return Vec::new();
    };

    let mut sum = vec![0.0f32; first.embedding.len()];
    let mut total_weight = 0.0f32;

    for sentence in sentences {
        let w = weight(sentence);
        total_weight += w;
        for (acc, value) in sum.iter_mut().zip(&sentence.embedding) {
            *acc += w * value;
        }
    }

    if total_weight > 0.0 {
        for value in &mut sum {
            *value /= total_weight;
        }
    }

    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(tokens: usize, embedding: Vec<f32>) -> Sentence {
        Sentence::new("s".to_string(), 0, 1, tokens, embedding)
    }

    #[test]
    fn test_mean_pooling_averages() {
        let group = vec![sentence(1, vec![1.0, 0.0]), sentence(3, vec![0.0, 1.0])];
        assert_eq!(MeanPooling.embed_group(&group), vec![0.5, 0.5]);
    }

    #[test]
    fn test_token_weighted_pooling_weights_by_tokens() {
        let group = vec![sentence(1, vec![1.0, 0.0]), sentence(3, vec![0.0, 1.0])];
        assert_eq!(TokenWeightedPooling.embed_group(&group), vec![0.25, 0.75]);
    }

    #[test]
    fn test_token_weighted_pooling_zero_tokens_falls_back_to_mean() {
        let group = vec![sentence(0, vec![2.0]), sentence(0, vec![4.0])];
        assert_eq!(TokenWeightedPooling.embed_group(&group), vec![3.0]);
    }

    #[test]
    fn test_single_sentence_keeps_embedding() {
        let group = vec![sentence(5, vec![0.3, -0.7])];
        assert_eq!(TokenWeightedPooling.embed_group(&group), vec![0.3, -0.7]);
        assert_eq!(MeanPooling.embed_group(&group), vec![0.3, -0.7]);
    }

    #[test]
    fn test_empty_group_is_empty_vector() {
        assert!(MeanPooling.embed_group(&[]).is_empty());
    }

    #[test]
    fn test_pooling_strategy_serde() {
        let strategy: PoolingStrategy = serde_json::from_str("\"mean\"").unwrap();
        assert_eq!(strategy, PoolingStrategy::Mean);
        assert_eq!(
            serde_json::to_string(&PoolingStrategy::TokenWeighted).unwrap(),
            "\"token_weighted\""
        );
        assert_eq!(PoolingStrategy::default(), PoolingStrategy::TokenWeighted);
    }
}
