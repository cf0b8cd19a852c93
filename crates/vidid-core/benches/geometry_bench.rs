//! Benchmarks for vidid-core geometry operations.
//!
//! Run with: cargo bench -p vidid-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vidid_core::regression::linear_regression;
use vidid_core::Coord;

fn bench_coord_overlap(c: &mut Criterion) {
    let a = Coord::new(100, 100, 80, 80).unwrap();
    let b = Coord::new(120, 110, 80, 80).unwrap();

    c.bench_function("coord_overlap", |bencher| {
        bencher.iter(|| black_box(&a).overlap(black_box(&b)));
    });

    c.bench_function("coord_intersection_area", |bencher| {
        bencher.iter(|| black_box(&a).intersection_area(black_box(&b)));
    });
}

fn bench_coord_portrait(c: &mut Criterion) {
    let coord = Coord::new(400, 300, 120, 140).unwrap();

    c.bench_function("coord_default_portrait", |bencher| {
        bencher.iter(|| black_box(&coord).default_portrait(Some((1920, 1080))));
    });
}

fn bench_linear_regression(c: &mut Criterion) {
    let points: Vec<(f64, f64)> = (0..90).map(|i| (i as f64, i as f64 * 1.7 + 3.0)).collect();

    c.bench_function("linear_regression_90_points", |bencher| {
        bencher.iter(|| linear_regression(black_box(&points)));
    });
}

criterion_group!(
    benches,
    bench_coord_overlap,
    bench_coord_portrait,
    bench_linear_regression
);
criterion_main!(benches);
