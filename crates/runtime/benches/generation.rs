// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the regressor forward pass and autoregressive steps.
//!
//! Weights are synthetic; only the shapes matter for timing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use model_ir::{CheckpointWriter, ModelConfig, ModelGraph};
use pose_core::PoseVector;
use runtime::{AutoregressiveGenerator, PosePredictor, StgcnRegressor, WeightStore};
use std::sync::atomic::AtomicBool;
use tensor_core::{Kernel, Tensor};

const SEQ_LEN: usize = 32;

fn regressor(hidden: &[usize]) -> StgcnRegressor {
    let mut cfg = ModelConfig::new(SEQ_LEN);
    cfg.hidden_channels = hidden.to_vec();
    let graph = ModelGraph::from_config("bench", &cfg)
        .unwrap()
        .validate()
        .unwrap();
    let store = WeightStore::from_checkpoint(&CheckpointWriter::synthetic(&graph, 7));
    StgcnRegressor::from_weights(&graph, store).unwrap()
}

fn seed(dim: usize) -> Vec<PoseVector> {
    (0..SEQ_LEN)
        .map(|t| PoseVector::new((0..dim).map(|i| ((t * dim + i) % 13) as f32 * 0.05).collect()))
        .collect()
}

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("stgcn_forward");
    group.sample_size(20);
    for hidden in [vec![16usize, 32], vec![64, 128, 256]] {
        let model = regressor(&hidden);
        let input = Tensor::zeros(model.input_shape().clone());
        for kernel in [Kernel::Scalar, Kernel::Wide] {
            group.bench_with_input(
                BenchmarkId::new(kernel.as_str(), format!("{hidden:?}")),
                &kernel,
                |b, &k| b.iter(|| black_box(model.predict(&input, k).unwrap())),
            );
        }
    }
    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let model = regressor(&[16, 32]);
    let seed = seed(model.pose_dim());
    let cancel = AtomicBool::new(false);
    c.bench_function("generate_10_frames", |b| {
        b.iter(|| {
            let generator = AutoregressiveGenerator::new(&model, &seed, Kernel::Wide).unwrap();
            black_box(generator.run(10, &cancel).unwrap())
        })
    });
}

criterion_group!(benches, bench_forward, bench_generate);
criterion_main!(benches);
