// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully-connected layer.

use super::{dot, Kernel};
use crate::{Shape, Tensor, TensorError, TensorView};

/// Fully-connected layer: `output = input @ weight^T + bias`.
///
/// `input` is `[M, K]`, `weight` is `[N, K]` (out-features major, as stored
/// in the checkpoint), `bias` is `[N]` and `output` must be `[M, N]`.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if any dimension disagrees.
pub fn linear(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: &TensorView<'_>,
    output: &mut Tensor,
    kernel: Kernel,
) -> Result<(), TensorError> {
    let (m, k) = match input.shape().dims() {
        &[m, k] => (m, k),
        _ => {
            return Err(TensorError::RankMismatch {
                op: "linear",
                expected: 2,
                actual: input.shape().clone(),
            })
        }
    };
    let n = match weight.shape().dims() {
        &[n, wk] if wk == k => n,
        _ => {
            return Err(TensorError::ShapeMismatch {
                op: "linear (weight)",
                lhs: input.shape().clone(),
                rhs: weight.shape().clone(),
            })
        }
    };
    if bias.shape().dims() != [n] {
        return Err(TensorError::ShapeMismatch {
            op: "linear (bias)",
            lhs: Shape::vector(n),
            rhs: bias.shape().clone(),
        });
    }
    let expected_shape = Shape::matrix(m, n);
    if output.shape() != &expected_shape {
        return Err(TensorError::ShapeMismatch {
            op: "linear (output)",
            lhs: expected_shape,
            rhs: output.shape().clone(),
        });
    }

    let x = input.as_slice();
    let w = weight.as_slice();
    let b = bias.as_slice();
    let out = output.as_mut_slice();
    for i in 0..m {
        let row = &x[i * k..(i + 1) * k];
        for j in 0..n {
            out[i * n + j] = dot(kernel, row, &w[j * k..(j + 1) * k]) + b[j];
        }
    }
    Ok(())
}
