// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Dense `f32` tensors and the handful of kernels a spatio-temporal pose
//! predictor needs at inference time.
//!
//! This crate provides:
//! - [`Tensor`] — an owned, row-major `f32` tensor, plus the borrowed [`TensorView`].
//! - [`Shape`] — runtime shape descriptors with `(N, C, T, V)` helpers.
//! - [`DType`] — element types that may appear in a checkpoint.
//! - Kernels: temporal convolution, pointwise (1×1) convolution, eval-mode
//!   batch normalisation, ReLU, global average pooling and a linear layer.
//!
//! # Layout Convention
//! Activations are 4-D `(batch, channel, time, joint)` tensors, stored
//! row-major, so one `(time, joint)` plane per channel is contiguous.
//!
//! # Kernels
//! Every kernel writes into a pre-allocated output tensor. Inner products
//! dispatch on [`Kernel`]: `Scalar` is a plain loop, `Wide` uses eight
//! independent accumulators that the compiler lowers to SIMD lanes.

mod dtype;
mod error;
mod ops;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use ops::{
    batch_norm, global_avg_pool, linear, pointwise_conv, relu_inplace,
    temporal_conv, BatchNormParams, Kernel,
};
pub use shape::Shape;
pub use tensor::{Tensor, TensorView};
