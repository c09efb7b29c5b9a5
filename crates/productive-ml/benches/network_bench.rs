//! Dense Network and Ensemble Benchmarks
//!
//! Forward and training throughput for the smallest and largest role
//! architectures, plus a full ingest-and-train pass over the ensemble.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use productive_ml::{
    DenseNetwork, EngineConfig, Ensemble, ModelRole, SyntheticTelemetry, TrainingParams,
};

const ROLES: [ModelRole; 2] = [ModelRole::SecurityAnalysis, ModelRole::PatternRecognition];

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_forward");

    for role in ROLES {
        let arch = role.architecture();
        let input = vec![0.5f32; arch.input_dim];
        let net = DenseNetwork::new(arch, TrainingParams::default(), 42).unwrap();

        group.bench_with_input(BenchmarkId::new("predict", role), &input, |bench, input| {
            bench.iter(|| net.predict(black_box(input)).unwrap());
        });
    }

    group.finish();
}

fn bench_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_train");

    for role in ROLES {
        let arch = role.architecture();
        let input = vec![0.5f32; arch.input_dim];
        let target = vec![0.8f32; arch.output_dim];
        let mut net = DenseNetwork::new(arch, TrainingParams::default(), 42).unwrap();

        group.bench_function(BenchmarkId::new("train", role), |bench| {
            bench.iter(|| net.train(black_box(&input), black_box(&target)).unwrap());
        });
    }

    group.finish();
}

fn bench_ensemble_cycle(c: &mut Criterion) {
    let ensemble = Ensemble::new(&EngineConfig::default()).unwrap();
    let source = SyntheticTelemetry::new(7);
    for _ in 0..20 {
        ensemble.ingest(&source.generate());
    }

    c.bench_function("ensemble_ingest_and_train_all", |bench| {
        bench.iter(|| {
            ensemble.ingest(&source.generate());
            for role in ModelRole::ALL {
                black_box(ensemble.train_batch(role, 4));
            }
        });
    });
}

criterion_group!(benches, bench_forward, bench_train, bench_ensemble_cycle);
criterion_main!(benches);
