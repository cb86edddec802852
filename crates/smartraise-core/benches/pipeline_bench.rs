//! # Pipeline Benchmarks
//!
//! Performance benchmarks for smartraise-core inference and artifact decoding.
//!
//! Run with: `cargo bench -p smartraise-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use smartraise_core::model::LEAF;
use smartraise_core::{
    Artifacts, DecisionTree, ForestTask, InferencePipeline, LinearRegression, ModelSpec,
    RandomForest, StandardScaler, model_from_bytes, model_to_bytes, model_to_json,
};
use std::hint::black_box;

fn linear_pipeline(n: usize) -> InferencePipeline {
    let scaler = StandardScaler::new(vec![1.0; n], vec![2.0; n]).expect("scaler");
    let model = ModelSpec::LinearRegression(LinearRegression {
        coefficients: (0..n).map(|i| i as f64 * 0.01).collect(),
        intercept: 1.0,
    });
    Artifacts::new(scaler, model).expect("pair").into_pipeline()
}

/// Complete tree of the given depth, splitting on features round-robin.
fn full_tree(depth: u32, n_features: usize) -> DecisionTree {
    let nodes = (1usize << (depth + 1)) - 1;
    let internal = (1usize << depth) - 1;
    let mut tree = DecisionTree {
        feature: Vec::with_capacity(nodes),
        threshold: Vec::with_capacity(nodes),
        left: Vec::with_capacity(nodes),
        right: Vec::with_capacity(nodes),
        value: Vec::with_capacity(nodes),
    };
    for i in 0..nodes {
        if i < internal {
            tree.feature.push((i % n_features) as i32);
            tree.threshold.push(0.0);
            tree.left.push((2 * i + 1) as i32);
            tree.right.push((2 * i + 2) as i32);
            tree.value.push(vec![0.0, 0.0]);
        } else {
            tree.feature.push(-2);
            tree.threshold.push(-2.0);
            tree.left.push(LEAF);
            tree.right.push(LEAF);
            tree.value.push(vec![(i % 3) as f64, 1.0]);
        }
    }
    tree
}

fn forest(trees: usize, depth: u32, n_features: usize) -> ModelSpec {
    ModelSpec::RandomForest(RandomForest {
        task: ForestTask::Classification {
            classes: vec![0, 1],
        },
        n_features,
        trees: (0..trees).map(|_| full_tree(depth, n_features)).collect(),
    })
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_linear_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_predict");

    for size in [3, 32, 512].iter() {
        let pipeline = linear_pipeline(*size);
        let input: Vec<f64> = (0..*size).map(|i| i as f64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(pipeline.predict(black_box(&input))))
        });
    }

    group.finish();
}

fn bench_forest_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("forest_predict");

    for trees in [10, 100].iter() {
        let scaler = StandardScaler::new(vec![0.0; 3], vec![1.0; 3]).expect("scaler");
        let pipeline = Artifacts::new(scaler, forest(*trees, 8, 3))
            .expect("pair")
            .into_pipeline();
        let input = [0.5, -0.5, 1.5];
        group.bench_with_input(BenchmarkId::from_parameter(trees), trees, |b, _| {
            b.iter(|| black_box(pipeline.predict(black_box(&input))))
        });
    }

    group.finish();
}

fn bench_decode_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_model");
    let model = forest(100, 8, 3);
    let binary = model_to_bytes(&model).expect("binary");
    let json = model_to_json(&model).expect("json");

    group.bench_function("binary", |b| {
        b.iter(|| black_box(model_from_bytes(black_box(&binary))))
    });
    group.bench_function("json", |b| {
        b.iter(|| black_box(model_from_bytes(black_box(&json))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_linear_predict,
    bench_forest_predict,
    bench_decode_model,
);

criterion_main!(benches);
