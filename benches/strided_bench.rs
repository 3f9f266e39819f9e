//! Benchmarks for the unrolled fast paths and the dispatch overhead.
//!
//! Run with: cargo bench --bench strided_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;
use std::time::Duration;
use stdlib_strided::apply::unary;
use stdlib_strided::blas::{daxpy, dfill};
use stdlib_strided::ops::abs;
use stdlib_strided::{Buffer, StridedView};

fn random_vec(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

/// Unit-stride (unrolled) fill vs stride-2 (engine) fill.
fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("dfill");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for size in [1000, 10000, 100000] {
        group.throughput(Throughput::Elements(size as u64));
        let mut x = vec![0.0f64; 2 * size];

        group.bench_with_input(BenchmarkId::new("unrolled", size), &size, |bench, &n| {
            bench.iter(|| dfill(n, black_box(3.0), &mut x, 1))
        });
        group.bench_with_input(BenchmarkId::new("strided", size), &size, |bench, &n| {
            bench.iter(|| dfill(n, black_box(3.0), &mut x, 2))
        });
    }
    group.finish();
}

fn bench_axpy(c: &mut Criterion) {
    let mut group = c.benchmark_group("daxpy");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for size in [1000, 10000, 100000] {
        group.throughput(Throughput::Elements(size as u64));

        let mut rng = StdRng::seed_from_u64(42);
        let x = random_vec(&mut rng, 2 * size);
        let mut y = random_vec(&mut rng, 2 * size);

        group.bench_with_input(BenchmarkId::new("unrolled", size), &size, |bench, &n| {
            bench.iter(|| daxpy(n, black_box(0.5), &x, 1, &mut y, 1))
        });
        group.bench_with_input(BenchmarkId::new("strided", size), &size, |bench, &n| {
            bench.iter(|| daxpy(n, black_box(0.5), &x, 2, &mut y, 2))
        });
    }
    group.finish();
}

/// Dispatched `abs` vs calling the apply engine directly.
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("abs");
    group.sample_size(20);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for size in [16, 1000, 100000] {
        group.throughput(Throughput::Elements(size as u64));

        let mut rng = StdRng::seed_from_u64(42);
        let data = random_vec(&mut rng, size);
        let x = Buffer::from(data.clone());
        let mut y = Buffer::from(vec![0.0f64; size]);
        let mut out = vec![0.0f64; size];

        group.bench_with_input(BenchmarkId::new("dispatched", size), &size, |bench, &n| {
            bench.iter(|| abs(n, &x, 1, &mut y, 1).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("direct", size), &size, |bench, &n| {
            bench.iter(|| {
                let xv = StridedView::new_unchecked(&data[..], n, 1, 0);
                let mut yv = StridedView::new_unchecked(&mut out[..], n, 1, 0);
                unary(n, &xv, &mut yv, f64::abs);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fill, bench_axpy, bench_dispatch);
criterion_main!(benches);
