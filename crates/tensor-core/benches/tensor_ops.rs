// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for tensor operations at pose-model sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tensor_core::{linear, pointwise_conv, temporal_conv, Kernel, Shape, Tensor};

const SEQ_LEN: usize = 32;
const JOINTS: usize = 33;

fn ramp(shape: Shape) -> Tensor {
    let n = shape.num_elements();
    let data = (0..n).map(|i| ((i % 97) as f32 - 48.0) * 0.01).collect();
    Tensor::from_vec(shape, data).unwrap()
}

fn bench_temporal_conv(c: &mut Criterion) {
    let mut group = c.benchmark_group("temporal_conv");
    for &(c_in, c_out) in &[(64usize, 64usize), (64, 128), (128, 256)] {
        let input = ramp(Shape::nctv(1, c_in, SEQ_LEN, JOINTS));
        let weight = ramp(Shape::conv(c_out, c_in, 3, 1));
        let bias = ramp(Shape::vector(c_out));
        let mut out = Tensor::zeros(Shape::nctv(1, c_out, SEQ_LEN, JOINTS));
        for kernel in [Kernel::Scalar, Kernel::Wide] {
            group.bench_with_input(
                BenchmarkId::new(kernel.as_str(), format!("{c_in}->{c_out}")),
                &kernel,
                |b, &k| {
                    b.iter(|| {
                        temporal_conv(&input.view(), &weight.view(), &bias.view(), &mut out, k)
                            .unwrap();
                        black_box(out.as_slice()[0]);
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_pointwise_conv(c: &mut Criterion) {
    let input = ramp(Shape::nctv(1, 128, SEQ_LEN, JOINTS));
    let weight = ramp(Shape::conv(128, 128, 1, 1));
    let bias = ramp(Shape::vector(128));
    let mut out = Tensor::zeros(Shape::nctv(1, 128, SEQ_LEN, JOINTS));
    c.bench_function("pointwise_conv_128", |b| {
        b.iter(|| {
            pointwise_conv(&input.view(), &weight.view(), &bias.view(), &mut out, Kernel::Wide)
                .unwrap();
            black_box(out.as_slice()[0]);
        })
    });
}

fn bench_linear(c: &mut Criterion) {
    let input = ramp(Shape::matrix(1, 256));
    let weight = ramp(Shape::matrix(99, 256));
    let bias = ramp(Shape::vector(99));
    let mut out = Tensor::zeros(Shape::matrix(1, 99));
    c.bench_function("linear_256x99", |b| {
        b.iter(|| {
            linear(&input.view(), &weight.view(), &bias.view(), &mut out, Kernel::Wide).unwrap();
            black_box(out.as_slice()[0]);
        })
    });
}

criterion_group!(benches, bench_temporal_conv, bench_pointwise_conv, bench_linear);
criterion_main!(benches);
