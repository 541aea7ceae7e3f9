//! Property tests for the skip-window merge pass
//!
//! Inputs are generated from a fixed-seed generator so failures reproduce.

mod common;

use common::{flatten, random_groups, sentence, topic_groups, Lcg};
use sdpm_core::semantic::merge::SkipMerger;
use sdpm_core::semantic::pooling::{GroupEmbedder, MeanPooling, TokenWeightedPooling};
use sdpm_core::semantic::similarity::{CosineSimilarity, SimilarityMeasure};
use sdpm_core::semantic::types::{Sentence, SentenceGroup};
use std::sync::Mutex;

const SEEDS: std::ops::Range<u64> = 0..40;
const THRESHOLDS: &[f32] = &[0.0, 0.3, 0.6, 0.9, 1.0];

#[test]
fn test_merge_conserves_sentences_in_order() {
    for seed in SEEDS {
        let mut rng = Lcg::new(seed);
        let count = rng.next_below(12);
        let groups = random_groups(&mut rng, count, 6);
        let expected = flatten(&groups);

        for skip_window in 0..4 {
            for &threshold in THRESHOLDS {
                let merger = SkipMerger::new(skip_window, &CosineSimilarity, &MeanPooling);
                let merged = merger.merge(groups.clone(), threshold);

                assert_eq!(
                    flatten(&merged),
                    expected,
                    "seed {} window {} threshold {}",
                    seed,
                    skip_window,
                    threshold
                );
                assert!(merged.iter().all(|g| !g.is_empty()));
            }
        }
    }
}

#[test]
fn test_merge_never_grows() {
    for seed in SEEDS {
        let mut rng = Lcg::new(seed);
        let count = 1 + rng.next_below(15);
        let groups = random_groups(&mut rng, count, 4);

        for skip_window in 0..4 {
            for &threshold in THRESHOLDS {
                let merger =
                    SkipMerger::new(skip_window, &CosineSimilarity, &TokenWeightedPooling);
                let merged = merger.merge(groups.clone(), threshold);
                assert!(merged.len() <= groups.len());
            }
        }
    }
}

#[test]
fn test_threshold_above_every_score_keeps_input() {
    for seed in SEEDS {
        let mut rng = Lcg::new(seed);
        let groups = random_groups(&mut rng, 8, 5);

        let merger = SkipMerger::new(2, &CosineSimilarity, &MeanPooling);
        // Cosine similarity never exceeds 1.0
        let merged = merger.merge(groups.clone(), 1.5);
        assert_eq!(merged, groups);
    }
}

#[test]
fn test_minimal_threshold_collapses_everything() {
    let mut rng = Lcg::new(7);
    let groups = random_groups(&mut rng, 10, 3);

    // Cosine scores never fall below -1, so every pair qualifies
    let merger = SkipMerger::new(1, &CosineSimilarity, &MeanPooling);
    let merged = merger.merge(groups.clone(), -1.0);
    assert_eq!(merged.len(), 1);
    assert_eq!(flatten(&merged), flatten(&groups));
}

#[test]
fn test_trivial_inputs() {
    let merger = SkipMerger::new(1, &CosineSimilarity, &MeanPooling);
    assert!(merger.merge(Vec::new(), 0.5).is_empty());

    let single = topic_groups(&[0], 2);
    assert_eq!(merger.merge(single.clone(), 0.0), single);
}

#[test]
fn test_merge_is_idempotent_on_separated_input() {
    // Topic 0 is interrupted by topic 1, topic 2 by topic 3
    let groups = topic_groups(&[0, 1, 0, 2, 3, 2, 4], 5);

    for skip_window in 1..4 {
        let merger = SkipMerger::new(skip_window, &CosineSimilarity, &MeanPooling);
        let once = merger.merge(groups.clone(), 0.5);
        let twice = merger.merge(once.clone(), 0.5);

        assert_eq!(once, twice, "window {}", skip_window);
    }

    let merger = SkipMerger::new(1, &CosineSimilarity, &MeanPooling);
    let merged = merger.merge(groups, 0.5);
    let sizes: Vec<usize> = merged.iter().map(SentenceGroup::len).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[test]
fn test_interrupted_topic_scenario() {
    // A and C share a topic, B is a digression
    let groups = topic_groups(&[0, 1, 0], 2);
    let merger = SkipMerger::new(1, &CosineSimilarity, &MeanPooling);

    let merged = merger.merge(groups.clone(), 0.8);
    assert_eq!(merged.len(), 1);
    let expected: String = groups.iter().map(SentenceGroup::text).collect();
    assert_eq!(merged[0].text(), expected);
}

#[test]
fn test_adjacent_pair_scenario() {
    // Only A and B are similar
    let mut groups = topic_groups(&[0, 0, 1, 2], 3);
    groups[1] = SentenceGroup::single(sentence(1, vec![0.9, 0.1, 0.0]));

    let merger = SkipMerger::new(1, &CosineSimilarity, &MeanPooling);
    let merged = merger.merge(groups, 0.8);

    let sizes: Vec<usize> = merged.iter().map(SentenceGroup::len).collect();
    assert_eq!(sizes, vec![2, 1, 1]);
}

/// Embeds a group as the ids of its first and last sentence
struct SpanEmbedder;

impl GroupEmbedder for SpanEmbedder {
    fn embed_group(&self, sentences: &[Sentence]) -> Vec<f32> {
        let id = |s: &Sentence| s.text[1..5].parse::<f32>().unwrap_or(-1.0);
        match (sentences.first(), sentences.last()) {
            (Some(first), Some(last)) => vec![id(first), id(last)],
            _ => Vec::new(),
        }
    }
}

/// Records every compared pair and answers from a fixed rule
struct RecordingMeasure {
    pairs: Mutex<Vec<(f32, f32)>>,
    similar: fn(f32, f32) -> bool,
}

impl SimilarityMeasure for RecordingMeasure {
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        // a is the head, b the candidate: record head end and candidate start
        self.pairs.lock().unwrap().push((a[1], b[0]));
        if (self.similar)(a[1], b[0]) {
            1.0
        } else {
            0.0
        }
    }
}

#[test]
fn test_window_zero_only_compares_neighbours() {
    let measure = RecordingMeasure {
        pairs: Mutex::new(Vec::new()),
        // Every third sentence starts a new topic
        similar: |_, candidate| candidate as usize % 3 != 0,
    };
    let groups: Vec<SentenceGroup> = (0..10)
        .map(|id| SentenceGroup::single(sentence(id, Vec::new())))
        .collect();

    let merger = SkipMerger::new(0, &measure, &SpanEmbedder);
    let merged = merger.merge(groups, 0.5);

    let pairs = measure.pairs.lock().unwrap();
    assert!(!pairs.is_empty());
    for &(head_end, candidate_start) in pairs.iter() {
        assert_eq!(candidate_start, head_end + 1.0);
    }

    let sizes: Vec<usize> = merged.iter().map(SentenceGroup::len).collect();
    assert_eq!(sizes, vec![3, 3, 3, 1]);
}

#[test]
fn test_skip_window_bounds_comparison_distance() {
    for skip_window in 0..4usize {
        let measure = RecordingMeasure {
            pairs: Mutex::new(Vec::new()),
            similar: |_, _| false,
        };
        let groups: Vec<SentenceGroup> = (0..12)
            .map(|id| SentenceGroup::single(sentence(id, Vec::new())))
            .collect();

        let merger = SkipMerger::new(skip_window, &measure, &SpanEmbedder);
        let merged = merger.merge(groups.clone(), 0.5);
        assert_eq!(merged, groups);

        let pairs = measure.pairs.lock().unwrap();
        let max_gap = pairs
            .iter()
            .map(|&(head, candidate)| (candidate - head) as usize)
            .max()
            .unwrap_or(0);
        assert_eq!(max_gap, skip_window + 1);
    }
}
