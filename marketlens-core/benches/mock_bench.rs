//! Criterion benchmarks for mock generation.
//!
//! Benchmarks:
//! 1. ZIP seeding
//! 2. Provider-shaped generators
//! 3. Full standard records per source

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use marketlens_core::mock;
use marketlens_core::DataSource;

fn zips(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{:05}", (i * 7919) % 100_000)).collect()
}

fn bench_seed(c: &mut Criterion) {
    let zips = zips(1_000);
    c.bench_function("zip_to_seed_1000", |b| {
        b.iter(|| {
            zips.iter()
                .map(|z| mock::zip_to_seed(black_box(z)) as u64)
                .sum::<u64>()
        })
    });
}

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("mock_shape");
    group.bench_function("zillow", |b| b.iter(|| mock::zillow(black_box("90210"))));
    group.bench_function("realtor", |b| b.iter(|| mock::realtor(black_box("90210"))));
    group.bench_function("census", |b| b.iter(|| mock::census(black_box("90210"))));
    group.bench_function("mls", |b| b.iter(|| mock::mls(black_box("90210"))));
    group.bench_function("county_assessor", |b| {
        b.iter(|| mock::county_assessor(black_box("90210")))
    });
    group.finish();
}

fn bench_standard(c: &mut Criterion) {
    let as_of = Utc::now();
    let mut group = c.benchmark_group("mock_standard");
    for source in DataSource::ADAPTERS {
        group.bench_with_input(BenchmarkId::from_parameter(source), &source, |b, &s| {
            b.iter(|| mock::mock_standard(s, black_box("60601"), as_of))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_seed, bench_generators, bench_standard);
criterion_main!(benches);
