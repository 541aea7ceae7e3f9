//! First-pass sentence grouping
//!
//! The first pass turns the flat sentence list into adjacent groups using the
//! calibrated threshold. The skip-merge pass then works on these groups.

use super::pooling::GroupEmbedder;
use super::similarity::SimilarityMeasure;
use super::types::{Sentence, SentenceGroup};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the first pass forms groups
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// Cut wherever a sentence is dissimilar to the window before it
    #[default]
    Window,
    /// Grow each group while the next sentence stays similar to it
    Cumulative,
}

/// Similarity of each sentence to the sentences just before it
///
/// Entry `k` compares sentence `k + 1` with the group embedding of up to
/// `similarity_window` preceding sentences, so the result has one entry
/// fewer than `sentences`.
pub fn window_similarities(
    sentences: &[Sentence],
    similarity_window: usize,
    measure: &dyn SimilarityMeasure,
    embedder: &dyn GroupEmbedder,
) -> Vec<f32> {
    let window = similarity_window.max(1);

    (1..sentences.len())
        .map(|i| {
            let window_start = i.saturating_sub(window);
            let window_embedding = embedder.embed_group(&sentences[window_start..i]);
            measure.similarity(&window_embedding, &sentences[i].embedding)
        })
        .collect()
}

/// Group boundaries derived from window similarities
///
/// A new group starts at sentence `k + 1` whenever `similarities[k]` is at or
/// below `threshold`. Cuts that would leave a group with fewer than
/// `min_sentences` sentences are skipped, which folds the short segment into
/// its predecessor. The returned list starts with `0` and ends with the
/// sentence count; consecutive entries delimit one group.
///
/// # Examples
///
/// ```
/// use sdpm_core::semantic::grouping::split_indices;
///
/// let similarities = [0.9, 0.1, 0.8, 0.2];
/// assert_eq!(split_indices(&similarities, 0.5, 1), vec![0, 2, 4, 5]);
/// assert_eq!(split_indices(&similarities, 0.5, 2), vec![0, 2, 5]);
/// ```
pub fn split_indices(similarities: &[f32], threshold: f32, min_sentences: usize) -> Vec<usize> {
    let sentence_count = similarities.len() + 1;
    let min_sentences = min_sentences.max(1);

    let mut boundaries = vec![0];
    let mut last = 0;

    for (i, similarity) in similarities.iter().enumerate() {
        let candidate = i + 1;
        if *similarity <= threshold && candidate - last >= min_sentences {
            boundaries.push(candidate);
            last = candidate;
        }
    }

    if last != 0 && sentence_count - last < min_sentences {
        boundaries.pop();
    }

    boundaries.push(sentence_count);
    boundaries
}

/// Builds the initial sentence groups
pub struct FirstPassGrouper<'a> {
    measure: &'a dyn SimilarityMeasure,
    embedder: &'a dyn GroupEmbedder,
    mode: GroupingMode,
    min_sentences: usize,
}

impl<'a> FirstPassGrouper<'a> {
    pub fn new(
        measure: &'a dyn SimilarityMeasure,
        embedder: &'a dyn GroupEmbedder,
        mode: GroupingMode,
        min_sentences: usize,
    ) -> Self {
        Self {
            measure,
            embedder,
            mode,
            min_sentences: min_sentences.max(1),
        }
    }

    /// Groups `sentences` in order
    ///
    /// `similarities` must be the window similarities of `sentences`; only
    /// window mode reads them. Every sentence ends up in exactly one group.
    pub fn group(
        &self,
        sentences: Vec<Sentence>,
        threshold: f32,
        similarities: &[f32],
    ) -> Vec<SentenceGroup> {
        let groups = match self.mode {
            GroupingMode::Window => self.group_by_window(sentences, threshold, similarities),
            GroupingMode::Cumulative => self.group_cumulative(sentences, threshold),
        };

        debug!(
            "First pass ({:?}) produced {} groups at threshold {:.4}",
            self.mode,
            groups.len(),
            threshold
        );

        groups
    }

    fn group_by_window(
        &self,
        sentences: Vec<Sentence>,
        threshold: f32,
        similarities: &[f32],
    ) -> Vec<SentenceGroup> {
        let boundaries = split_indices(similarities, threshold, self.min_sentences);
        let mut remaining = sentences.into_iter();

        boundaries
            .windows(2)
            .filter_map(|bounds| {
                SentenceGroup::new(remaining.by_ref().take(bounds[1] - bounds[0]).collect())
            })
            .collect()
    }

    fn group_cumulative(&self, sentences: Vec<Sentence>, threshold: f32) -> Vec<SentenceGroup> {
        let mut remaining = sentences.into_iter();
        let mut current: Vec<Sentence> = remaining.by_ref().take(self.min_sentences).collect();
        let mut current_embedding = self.embedder.embed_group(&current);
        let mut groups = Vec::new();

        for sentence in remaining {
            let similarity = self
                .measure
                .similarity(&current_embedding, &sentence.embedding);

            if similarity >= threshold {
                current.push(sentence);
                current_embedding = self.embedder.embed_group(&current);
            } else {
                current_embedding = sentence.embedding.clone();
                groups.extend(SentenceGroup::new(std::mem::replace(
                    &mut current,
                    vec![sentence],
                )));
            }
        }

        groups.extend(SentenceGroup::new(current));
        groups
    }
}
