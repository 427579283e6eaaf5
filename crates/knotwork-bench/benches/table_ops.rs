//! Criterion micro-benchmarks for table construction and interpolated reads.
//!
//! Reads are compared against evaluating the function directly, which is the
//! trade a lookup table exists to win.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use knotwork_bench::{cos_profile, erf_profile, query_points, REFERENCE_POINTS};
use knotwork_table::SampleTable;
use knotwork_test_utils::unlimited_allocator;

const QUERIES: usize = 4096;

/// Benchmark: sampling `erf` at 1K, 10K and 100K knots.
fn bench_table_build(c: &mut Criterion) {
    let alloc = unlimited_allocator();
    let mut group = c.benchmark_group("table_build_erf");
    for n in [1_000, REFERENCE_POINTS, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let table = erf_profile(&alloc, n).unwrap();
                black_box(table.len());
            });
        });
    }
    group.finish();
}

/// Benchmark: checked reads, unchecked reads, and direct `erf` on 4K points.
fn bench_erf_read(c: &mut Criterion) {
    let alloc = unlimited_allocator();
    let table = erf_profile(&alloc, REFERENCE_POINTS).unwrap();
    let xs = query_points(42, QUERIES, 0.0, 7.0);

    let mut group = c.benchmark_group("erf_4k");
    group.bench_function("read", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += table.read(black_box(x)).unwrap();
            }
            black_box(acc)
        });
    });
    group.bench_function("interpolate", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += table.interpolate(black_box(x));
            }
            black_box(acc)
        });
    });
    group.bench_function("direct", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += libm::erf(black_box(x));
            }
            black_box(acc)
        });
    });
    group.finish();
}

/// Benchmark: unchecked reads vs direct `cos` on 4K points.
fn bench_cos_read(c: &mut Criterion) {
    let alloc = unlimited_allocator();
    let table = cos_profile(&alloc, REFERENCE_POINTS).unwrap();
    let xs = query_points(7, QUERIES, 0.0, std::f64::consts::TAU);

    let mut group = c.benchmark_group("cos_4k");
    group.bench_function("interpolate", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += table.interpolate(black_box(x));
            }
            black_box(acc)
        });
    });
    group.bench_function("direct", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for &x in &xs {
                acc += black_box(x).cos();
            }
            black_box(acc)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_table_build, bench_erf_read, bench_cos_read);
criterion_main!(benches);
