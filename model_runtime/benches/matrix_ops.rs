use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use model_runtime::prelude::*;

fn sample_real(n: usize) -> MatrixReal {
    Matrix::from_fn(n, n, |r, c| {
        let x = (r * 31 + c * 17) % 97;
        x as f64 / 97.0 - 0.5 + if r == c { n as f64 } else { 0.0 }
    })
    .unwrap()
}

fn sample_complex(n: usize) -> MatrixComplex {
    Matrix::from_fn(n, n, |r, c| {
        Complex::new(((r + 2 * c) % 13) as f64, ((3 * r + c) % 7) as f64 - 3.0)
    })
    .unwrap()
}

fn multiply_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiply");
    for n in [16, 64, 128] {
        let a = sample_real(n);
        let b = sample_real(n);
        group.bench_with_input(BenchmarkId::new("real", n), &n, |bench, _| {
            bench.iter(|| black_box(&a).multiply(black_box(&b)).unwrap())
        });
        let z = sample_complex(n);
        group.bench_with_input(BenchmarkId::new("complex", n), &n, |bench, _| {
            bench.iter(|| black_box(&z).multiply(black_box(&z)).unwrap())
        });
    }
    group.finish();
}

fn variant_dispatch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("variant_dispatch");
    let lhs = Variant::from(Matrix::<i64>::ones(32, 32).unwrap());
    let rhs = Variant::from(sample_real(32));
    group.bench_function("integer_plus_real_matrix", |b| {
        b.iter(|| black_box(&lhs).add(black_box(&rhs)).unwrap())
    });
    group.bench_function("scalar_promotion", |b| {
        b.iter(|| {
            Variant::from(black_box(3i64))
                .mul(&Variant::from(black_box(Complex::new(0.5, 1.0))))
                .unwrap()
        })
    });
    group.finish();
}

fn decomposition_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompositions");
    group.sample_size(20);
    for n in [16, 64] {
        let a = sample_real(n);
        group.bench_with_input(BenchmarkId::new("plu", n), &n, |b, _| {
            b.iter(|| black_box(&a).plu().unwrap())
        });
        group.bench_with_input(BenchmarkId::new("svd", n), &n, |b, _| {
            b.iter(|| black_box(&a).svd().unwrap())
        });
        group.bench_with_input(BenchmarkId::new("inverse", n), &n, |b, _| {
            b.iter(|| black_box(&a).inverse().unwrap())
        });
    }
    group.finish();
}

fn dft_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dft");
    // Power-of-two lengths take the radix-2 path, the others Bluestein.
    for n in [256, 1000, 1024] {
        let signal = Matrix::from_fn(n, 1, |r, _| Complex::new((r % 5) as f64, 0.0)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(&signal).dft().unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    multiply_benchmark,
    variant_dispatch_benchmark,
    decomposition_benchmark,
    dft_benchmark
);
criterion_main!(benches);
