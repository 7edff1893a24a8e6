// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Global average pooling over the time and joint axes.

use crate::{Shape, Tensor, TensorError, TensorView};

/// Reduces `[N, C, T, V]` to `[N, C]` by averaging each `(T, V)` plane.
pub fn global_avg_pool(input: &TensorView<'_>, output: &mut Tensor) -> Result<(), TensorError> {
    let (n, c, t_len, v) = input.shape().as_nctv().ok_or_else(|| TensorError::RankMismatch {
        op: "global_avg_pool",
        expected: 4,
        actual: input.shape().clone(),
    })?;
    let expected = Shape::matrix(n, c);
    if output.shape() != &expected {
        return Err(TensorError::ShapeMismatch {
            op: "global_avg_pool (output)",
            lhs: expected,
            rhs: output.shape().clone(),
        });
    }
    let plane = t_len * v;
    let denom = plane.max(1) as f32;
    let x = input.as_slice();
    for (i, o) in output.as_mut_slice().iter_mut().enumerate() {
        *o = x[i * plane..(i + 1) * plane].iter().sum::<f32>() / denom;
    }
    Ok(())
}
