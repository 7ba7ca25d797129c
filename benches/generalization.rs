//! Benchmarks for the selection stages.
//!
//! 1. **Index construction**: `PrQuadtree::build` over random surveys
//! 2. **Generalization**: label and radius models
//! 3. **Full pipeline**: `select_soundings` with the spade oracle
//!
//! Surveys are generated from a fixed seed, overridable through
//! `SOUNDING_BENCH_SEED` (decimal or 0x-hex).

#![allow(missing_docs)] // Criterion macros generate undocumented functions

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sounding_selection::prelude::*;
use std::hint::black_box;
use std::sync::OnceLock;

fn get_benchmark_seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(|| {
        std::env::var("SOUNDING_BENCH_SEED")
            .ok()
            .and_then(|s| {
                let s = s.trim();
                s.strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .map_or_else(|| s.parse().ok(), |hex| u64::from_str_radix(hex, 16).ok())
            })
            .unwrap_or(0x50DA)
    })
}

/// `n` soundings over a square whose side grows with `n`, so density stays
/// roughly constant across sizes.
fn random_survey(n: usize, seed: u64) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    #[allow(clippy::cast_precision_loss)]
    let side = (n as f64).sqrt() * 40.0;
    (0..n)
        .map(|_| {
            let x = rng.random_range(0.0..side);
            let y = rng.random_range(0.0..side);
            // Tenths, as surveys report them.
            let depth = f64::from(rng.random_range(5_u32..600)) / 10.0;
            sounding!(x, y, depth)
        })
        .collect()
}

const SIZES: [usize; 4] = [1_000, 5_000, 10_000, 50_000];

fn bench_quadtree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree_build");
    for &n in &SIZES {
        let survey = random_survey(n, get_benchmark_seed());
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &survey, |b, survey| {
            b.iter(|| {
                let (tree, _) = PrQuadtree::build(survey, 0..survey.len(), 8).unwrap();
                black_box(tree);
            });
        });
    }
    group.finish();
}

fn bench_generalize(c: &mut Criterion) {
    let models = [
        (
            "label",
            ConflictModel::Label(FootprintModel::new(20_000.0, LabelSpacing::default())),
        ),
        ("radius", ConflictModel::Radius(RadiusLookup::new(10.0, 40.0))),
    ];
    let mut group = c.benchmark_group("generalize");
    for &n in &SIZES {
        let survey = random_survey(n, get_benchmark_seed());
        group.throughput(Throughput::Elements(n as u64));
        for (name, model) in &models {
            group.bench_with_input(BenchmarkId::new(*name, n), &survey, |b, survey| {
                b.iter(|| {
                    let outcome = generalize(
                        survey,
                        model,
                        (n / 2_500).max(1),
                        &mut CollectingSink::default(),
                    )
                    .unwrap();
                    black_box(outcome);
                });
            });
        }
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let config = SelectionConfigBuilder::default()
        .scale(20_000_u32)
        .build()
        .unwrap();
    let mut group = c.benchmark_group("select_soundings");
    group.sample_size(10);
    for &n in &SIZES[..3] {
        let survey = random_survey(n, get_benchmark_seed());
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &survey, |b, survey| {
            b.iter(|| {
                let report = select_soundings(
                    &config,
                    &SelectionInput::new(survey),
                    &SpadeTriangulator,
                    &mut CollectingSink::default(),
                )
                .unwrap();
                black_box(report);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_quadtree_build, bench_generalize, bench_pipeline);
criterion_main!(benches);
