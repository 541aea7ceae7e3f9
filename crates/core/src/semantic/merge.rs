//! Skip-window merging of sentence groups
//!
//! The second pass of SDPM. First-pass grouping only joins neighbours, so a
//! topic interrupted by a short digression (a code sample, a quote, an
//! aside) ends up in several groups. The skip merger compares each group with
//! the group `skip_window + 1` positions ahead and, when they are similar
//! enough, swallows everything in between so the topic is reunited.
//!
//! # Examples
//!
//! ```
//! use sdpm_core::semantic::merge::SkipMerger;
//! use sdpm_core::semantic::pooling::MeanPooling;
//! use sdpm_core::semantic::similarity::CosineSimilarity;
//! use sdpm_core::semantic::types::{Sentence, SentenceGroup};
//!
//! let group = |text: &str, start: usize, embedding: Vec<f32>| {
//!     let end = start + text.len();
//!     SentenceGroup::single(Sentence::new(text.to_string(), start, end, 2, embedding))
//! };
//!
//! let groups = vec![
//!     group("Rust is fast. ", 0, vec![1.0, 0.0]),
//!     group("Unrelated aside. ", 14, vec![0.0, 1.0]),
//!     group("Rust is safe.", 31, vec![0.95, 0.05]),
//! ];
//!
//! let merger = SkipMerger::new(1, &CosineSimilarity, &MeanPooling);
//! let merged = merger.merge(groups, 0.8);
//!
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].text(), "Rust is fast. Unrelated aside. Rust is safe.");
//! ```

use super::pooling::GroupEmbedder;
use super::similarity::SimilarityMeasure;
use super::types::SentenceGroup;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Default number of groups the merger may look past
pub const DEFAULT_SKIP_WINDOW: usize = 1;

/// Merges similar groups that are up to `skip_window` groups apart
///
/// Each step compares the head of the working queue with the group at
/// `skip_index = min(skip_window + 1, len - 1)`. If the score meets the
/// threshold, groups `0..=skip_index` collapse into one group that stays at
/// the head. Otherwise the nearer candidates `skip_index - 1` down to `1` are
/// tried the same way. When nothing qualifies the head is final and moves to
/// the output.
///
/// Every step either shortens the queue or finalizes a group, so the loop
/// always terminates. Sentence order is never changed.
pub struct SkipMerger<'a> {
    skip_window: usize,
    measure: &'a dyn SimilarityMeasure,
    embedder: &'a dyn GroupEmbedder,
}

impl<'a> SkipMerger<'a> {
    pub fn new(
        skip_window: usize,
        measure: &'a dyn SimilarityMeasure,
        embedder: &'a dyn GroupEmbedder,
    ) -> Self {
        Self {
            skip_window,
            measure,
            embedder,
        }
    }

    pub fn skip_window(&self) -> usize {
        self.skip_window
    }

    /// Runs the skip-merge pass over `groups`
    ///
    /// The result holds exactly the input sentences in the input order and
    /// never has more groups than the input.
    pub fn merge(&self, groups: Vec<SentenceGroup>, threshold: f32) -> Vec<SentenceGroup> {
        if groups.len() <= 1 {
            return groups;
        }

        let input_len = groups.len();
        let mut queue: VecDeque<(SentenceGroup, Vec<f32>)> = groups
            .into_iter()
            .map(|group| {
                let embedding = self.embedder.embed_group(group.sentences());
                (group, embedding)
            })
            .collect();
        let mut merged = Vec::with_capacity(input_len);
        let mut merges = 0usize;

        while queue.len() > 1 {
            let skip_index = (self.skip_window + 1).min(queue.len() - 1);

            match self.merge_target(&queue, skip_index, threshold) {
                Some(target) => {
                    trace!("Merging groups 0..={} at the queue head", target);
                    let group = SentenceGroup::merge(queue.drain(..=target).map(|(g, _)| g));
                    let embedding = self.embedder.embed_group(group.sentences());
                    queue.push_front((group, embedding));
                    merges += 1;
                }
                None => {
                    if let Some((group, _)) = queue.pop_front() {
                        merged.push(group);
                    }
                }
            }
        }

        merged.extend(queue.into_iter().map(|(group, _)| group));

        debug!(
            "Skip merge (window {}) reduced {} groups to {} in {} merges",
            self.skip_window,
            input_len,
            merged.len(),
            merges
        );

        merged
    }

    /// Furthest candidate in `1..=skip_index` similar enough to the head
    fn merge_target(
        &self,
        queue: &VecDeque<(SentenceGroup, Vec<f32>)>,
        skip_index: usize,
        threshold: f32,
    ) -> Option<usize> {
        let head = &queue[0].1;
        (1..=skip_index)
            .rev()
            .find(|&k| self.measure.similarity(head, &queue[k].1) >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::pooling::MeanPooling;
    use crate::semantic::similarity::CosineSimilarity;
    use crate::semantic::types::Sentence;

    fn group(id: usize, embedding: Vec<f32>) -> SentenceGroup {
        let text = format!("g{} ", id);
        let start = id * text.len();
        SentenceGroup::single(Sentence::new(
            text.clone(),
            start,
            start + text.len(),
            1,
            embedding,
        ))
    }

    fn texts(groups: &[SentenceGroup]) -> Vec<String> {
        groups.iter().map(SentenceGroup::text).collect()
    }

    fn merger(skip_window: usize) -> SkipMerger<'static> {
        SkipMerger::new(skip_window, &CosineSimilarity, &MeanPooling)
    }

    #[test]
    fn test_empty_input() {
        assert!(merger(1).merge(Vec::new(), 0.5).is_empty());
    }

    #[test]
    fn test_single_group_unchanged() {
        let input = vec![group(0, vec![1.0, 0.0])];
        assert_eq!(merger(1).merge(input.clone(), 0.0), input);
    }

    #[test]
    fn test_skip_merge_reunites_interrupted_topic() {
        let input = vec![
            group(0, vec![1.0, 0.0, 0.0]),
            group(1, vec![0.0, 1.0, 0.0]),
            group(2, vec![0.9, 0.0, 0.1]),
        ];
        let merged = merger(1).merge(input, 0.5);
        assert_eq!(texts(&merged), vec!["g0 g1 g2 "]);
    }

    #[test]
    fn test_nearer_candidate_merges_when_skip_target_fails() {
        let input = vec![
            group(0, vec![1.0, 0.0, 0.0, 0.0]),
            group(1, vec![0.9, 0.1, 0.0, 0.0]),
            group(2, vec![0.0, 0.0, 1.0, 0.0]),
            group(3, vec![0.0, 0.0, 0.0, 1.0]),
        ];
        let merged = merger(1).merge(input, 0.5);
        assert_eq!(texts(&merged), vec!["g0 g1 ", "g2 ", "g3 "]);
    }

    #[test]
    fn test_window_zero_only_merges_neighbours() {
        let input = vec![
            group(0, vec![1.0, 0.0]),
            group(1, vec![0.0, 1.0]),
            group(2, vec![1.0, 0.0]),
        ];
        let merged = merger(0).merge(input.clone(), 0.5);
        assert_eq!(merged, input);
    }

    #[test]
    fn test_merge_cascades_from_the_head() {
        let input = vec![
            group(0, vec![1.0, 0.0]),
            group(1, vec![1.0, 0.05]),
            group(2, vec![1.0, 0.1]),
            group(3, vec![1.0, 0.0]),
            group(4, vec![1.0, 0.02]),
        ];
        let merged = merger(1).merge(input, 0.9);
        assert_eq!(texts(&merged), vec!["g0 g1 g2 g3 g4 "]);
    }

    #[test]
    fn test_no_similar_pairs_keeps_every_group() {
        let input: Vec<SentenceGroup> = (0..4)
            .map(|i| {
                let mut embedding = vec![0.0; 4];
                embedding[i] = 1.0;
                group(i, embedding)
            })
            .collect();
        let merged = merger(2).merge(input.clone(), 0.5);
        assert_eq!(merged, input);
    }

    #[test]
    fn test_skip_index_clamped_to_queue() {
        // A window far beyond the queue length still compares within bounds
        let input = vec![group(0, vec![1.0, 0.0]), group(1, vec![1.0, 0.0])];
        let merged = merger(10).merge(input, 0.5);
        assert_eq!(texts(&merged), vec!["g0 g1 "]);
    }
}
