//! Benchmarks for the SDPM chunking pipeline
//!
//! These benchmarks measure:
//! - Skip merging over growing group counts and skip windows
//! - Sentence splitting of documents of varying sizes
//! - Full document chunking with an in-process embedding provider
//!
//! Run with: cargo bench --package sdpm-core --bench skip_merge_bench

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sdpm_core::semantic::embeddings::{EmbeddingError, EmbeddingProvider};
use sdpm_core::semantic::merge::SkipMerger;
use sdpm_core::semantic::pooling::{MeanPooling, TokenWeightedPooling};
use sdpm_core::semantic::similarity::CosineSimilarity;
use sdpm_core::semantic::types::{Sentence, SentenceGroup};
use sdpm_core::{ChunkerConfig, SdpmChunker, SentenceSplitter, Threshold};
use std::sync::Arc;

const PARAGRAPH: &str = "Rust uses a borrow checker to keep references valid. \
The compiler rejects programs with dangling pointers. Gardens need water and rich soil. \
Cargo builds and tests every crate in the workspace. Ocean tides follow the moon. \
Coral reefs shelter small fish from the waves.\n\n";

/// Embeds text into a few dimensions derived from its bytes
struct HashProvider;

#[async_trait]
impl EmbeddingProvider for HashProvider {
    fn model_name(&self) -> &str {
        "hash"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.1f32; 16];
        for (i, byte) in text.bytes().enumerate() {
            vector[(byte as usize + i) % 16] += 1.0;
        }
        Ok(vector)
    }
}

/// Groups cycling through `topics` one-hot directions with slight noise
fn synthetic_groups(count: usize, topics: usize) -> Vec<SentenceGroup> {
    (0..count)
        .map(|id| {
            let mut embedding = vec![0.05f32; topics];
            embedding[(id / 3 + id % 2) % topics] = 1.0;
            let text = format!("sentence {} ", id);
            let start = id * 16;
            SentenceGroup::single(Sentence::new(
                text.clone(),
                start,
                start + text.len(),
                3,
                embedding,
            ))
        })
        .collect()
}

fn document(paragraphs: usize) -> String {
    PARAGRAPH.repeat(paragraphs)
}

fn bench_skip_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("skip_merge");

    for count in [16, 128, 1024] {
        let groups = synthetic_groups(count, 8);
        group.throughput(Throughput::Elements(count as u64));

        for skip_window in [0, 1, 4] {
            let merger = SkipMerger::new(skip_window, &CosineSimilarity, &MeanPooling);
            group.bench_with_input(
                BenchmarkId::new(format!("window_{}", skip_window), count),
                &groups,
                |b, groups| {
                    b.iter(|| merger.merge(black_box(groups.clone()), 0.6));
                },
            );
        }
    }

    group.finish();
}

fn bench_pooling(c: &mut Criterion) {
    let mut group = c.benchmark_group("pooling");
    let groups = synthetic_groups(512, 8);

    let mean = SkipMerger::new(2, &CosineSimilarity, &MeanPooling);
    group.bench_function("mean", |b| {
        b.iter(|| mean.merge(black_box(groups.clone()), 0.6));
    });

    let weighted = SkipMerger::new(2, &CosineSimilarity, &TokenWeightedPooling);
    group.bench_function("token_weighted", |b| {
        b.iter(|| weighted.merge(black_box(groups.clone()), 0.6));
    });

    group.finish();
}

fn bench_sentence_splitting(c: &mut Criterion) {
    let mut group = c.benchmark_group("sentence_splitting");
    let splitter = SentenceSplitter::new(12);

    for (name, paragraphs) in [("small", 1), ("medium", 20), ("large", 200)] {
        let content = document(paragraphs);
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &content, |b, content| {
            b.iter(|| splitter.split(black_box(content)));
        });
    }

    group.finish();
}

fn bench_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking");
    let rt = tokio::runtime::Runtime::new().unwrap();

    for (name, threshold) in [("fixed", Threshold::Fixed(0.7)), ("auto", Threshold::Auto)] {
        let config = ChunkerConfig {
            threshold,
            ..Default::default()
        };
        let chunker = SdpmChunker::new(config, Arc::new(HashProvider)).unwrap();
        let content = document(20);

        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_function(name, |b| {
            b.to_async(&rt)
                .iter(|| async { chunker.chunk(black_box(&content)).await.unwrap() });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_skip_merge,
    bench_pooling,
    bench_sentence_splitting,
    bench_chunking,
);
criterion_main!(benches);
