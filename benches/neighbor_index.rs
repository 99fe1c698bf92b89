//! Benchmarks for score set and neighbor index building.
//!
//! Benchmark targets:
//! - Directed index over 100 cogs: <5ms
//! - Symmetrized index over 100 cogs: <10ms
//! - Full score set over 50 cogs: <50ms

// Criterion macros generate items without docs - this is expected for benchmarks
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::collections::BTreeMap;
use std::hint::black_box;
use std::time::Duration;

use cogmesh::models::{Cog, CogId, DirectionMode, ScoreEntry, ScoreSet};
use cogmesh::{CogSystem, NeighborIndex};

/// A dense score set with deterministic pseudo-random scores.
fn dense_score_set(cogs: usize) -> ScoreSet {
    let mut set = ScoreSet::new("bench", "s", "");
    for from in 0..cogs {
        for to in (0..cogs).filter(|&to| to != from) {
            let seed = (from * 31 + to * 17) % 101;
            #[allow(clippy::cast_precision_loss)]
            let score = seed as f64 / 100.0;
            set.insert(ScoreEntry {
                from_cog_id: CogId::new(format!("cog-{from:03}")),
                to_cog_id: CogId::new(format!("cog-{to:03}")),
                score,
                vector: BTreeMap::new(),
                variance: 0.0,
                strategy_id: "s".to_string(),
            });
        }
    }
    set
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    group.measurement_time(Duration::from_secs(5));

    for size in [10_usize, 50, 100] {
        let set = dense_score_set(size);
        group.throughput(Throughput::Elements(set.entries.len() as u64));
        for mode in [DirectionMode::Directed, DirectionMode::Symmetrized] {
            group.bench_with_input(BenchmarkId::new(mode.as_str(), size), &set, |b, set| {
                b.iter(|| NeighborIndex::build(black_box(set), mode));
            });
        }
    }
    group.finish();
}

fn bench_range_group(c: &mut Criterion) {
    let index = NeighborIndex::build(&dense_score_set(100), DirectionMode::Directed);
    let seen = std::collections::BTreeSet::new();
    c.bench_function("range_group_100", |b| {
        b.iter(|| index.range_group(black_box("cog-042"), 0.05, &seen, None, None));
    });
}

fn bench_score_set_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_set_create");
    group.sample_size(20);

    for size in [10_usize, 50] {
        let mut system = CogSystem::new();
        system.register_default_word_feature_techniques();
        system
            .register_weighted_strategy_preset("aggregate_common", Some("w"), None)
            .unwrap();
        for i in 0..size {
            system
                .add_cog(Cog::new(format!("cog-{i:03}"), "bench").with_content(format!("content {i}")))
                .unwrap();
        }
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| {
                system.create_score_set("bench", "w", "", None).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index_build, bench_range_group, bench_score_set_create);
criterion_main!(benches);
