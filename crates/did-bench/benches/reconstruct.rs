//! Benchmarks for reconstruction strategies and degradation drivers.
//!
//! Run with: `cargo bench -p did-bench`

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use did_bench::{blank_page, edited_field, stains};
use did_compute::{PoolConfig, Strategy, enumerate_devices, reconstruct};
use did_ops::{NoiseGradients, ReconstructionConfig, apply_degradation};

const STEPS: usize = 40;

/// Benchmark each strategy on square fields.
fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");
    group.sample_size(10);

    let host = enumerate_devices().len() - 1;
    let strategies = [
        ("single-core", Strategy::Sequential),
        ("multi-cpu", Strategy::ThreadPool(PoolConfig::default())),
        ("host-device", Strategy::Accelerator { device: host }),
    ];

    for size in [128u32, 512] {
        let field = edited_field(size, size, 1);
        group.throughput(Throughput::Elements(size as u64 * size as u64 * STEPS as u64));

        for (name, strategy) in &strategies {
            group.bench_with_input(BenchmarkId::new(*name, size), &field, |b, f| {
                b.iter(|| {
                    let mut f = f.clone();
                    reconstruct(&mut f, black_box(STEPS), strategy).map(|_| f)
                })
            });
        }
    }

    group.finish();
}

/// Benchmark pool scaling with the worker count.
fn bench_pool_workers(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_workers");
    group.sample_size(10);

    let field = edited_field(384, 384, 2);
    for workers in [1usize, 2, 4, 8] {
        let strategy = Strategy::ThreadPool(PoolConfig::default().with_workers(workers));
        group.bench_with_input(BenchmarkId::from_parameter(workers), &field, |b, f| {
            b.iter(|| {
                let mut f = f.clone();
                reconstruct(&mut f, black_box(STEPS), &strategy).map(|_| f)
            })
        });
    }

    group.finish();
}

/// Benchmark a full noise degradation pass.
fn bench_noise_driver(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise_gradients");
    group.sample_size(10);

    let page = blank_page(256, 256);
    let driver = NoiseGradients::new(2.0, 1.5, stains(48, 4));
    let config = ReconstructionConfig::default()
        .with_iterations(STEPS)
        .with_strategy(Strategy::ThreadPool(PoolConfig::default()));

    group.bench_function("apply_256", |b| {
        b.iter(|| {
            let mut image = page.clone();
            let mut rng = StdRng::seed_from_u64(3);
            apply_degradation(&driver, &mut image, &config, &mut rng).map(|_| image)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_pool_workers, bench_noise_driver);
criterion_main!(benches);
