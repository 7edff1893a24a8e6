// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pointwise (1×1) convolution: a per-position channel mix.

use super::{axpy, Kernel};
use crate::{Shape, Tensor, TensorError, TensorView};

/// Mixes channels independently at every `(t, v)` position.
///
/// - `input`: `[N, C_in, T, V]`
/// - `weight`: `[C_out, C_in, 1, 1]`
/// - `bias`: `[C_out]`
/// - `output`: `[N, C_out, T, V]`
pub fn pointwise_conv(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: &TensorView<'_>,
    output: &mut Tensor,
    kernel: Kernel,
) -> Result<(), TensorError> {
    let (n, c_in, t_len, v) = input.shape().as_nctv().ok_or_else(|| TensorError::RankMismatch {
        op: "pointwise_conv",
        expected: 4,
        actual: input.shape().clone(),
    })?;
    let c_out = match weight.shape().dims() {
        &[co, ci, 1, 1] if ci == c_in => co,
        _ => {
            return Err(TensorError::ShapeMismatch {
                op: "pointwise_conv (weight)",
                lhs: input.shape().clone(),
                rhs: weight.shape().clone(),
            })
        }
    };
    if bias.shape().dims() != [c_out] {
        return Err(TensorError::ShapeMismatch {
            op: "pointwise_conv (bias)",
            lhs: Shape::vector(c_out),
            rhs: bias.shape().clone(),
        });
    }
    let expected = Shape::nctv(n, c_out, t_len, v);
    if output.shape() != &expected {
        return Err(TensorError::ShapeMismatch {
            op: "pointwise_conv (output)",
            lhs: expected,
            rhs: output.shape().clone(),
        });
    }

    let plane = t_len * v;
    let x = input.as_slice();
    let w = weight.as_slice();
    let b = bias.as_slice();
    let out = output.as_mut_slice();

    for batch in 0..n {
        for co in 0..c_out {
            let dst = &mut out[(batch * c_out + co) * plane..(batch * c_out + co + 1) * plane];
            dst.iter_mut().for_each(|o| *o = b[co]);
            for ci in 0..c_in {
                let src = &x[(batch * c_in + ci) * plane..(batch * c_in + ci + 1) * plane];
                axpy(kernel, w[co * c_in + ci], src, dst);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointwise_mixes_channels() {
        // Channels a = [1, 2], b = [3, 4]; outputs a + b and a - b + 1.
        let input = Tensor::from_f32(Shape::nctv(1, 2, 1, 2), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let weight = Tensor::from_f32(Shape::conv(2, 2, 1, 1), &[1.0, 1.0, 1.0, -1.0]).unwrap();
        let bias = Tensor::from_f32(Shape::vector(2), &[0.0, 1.0]).unwrap();
        for kernel in [Kernel::Scalar, Kernel::Wide] {
            let mut out = Tensor::zeros(Shape::nctv(1, 2, 1, 2));
            pointwise_conv(&input.view(), &weight.view(), &bias.view(), &mut out, kernel).unwrap();
            assert_eq!(out.as_slice(), &[4.0, 6.0, -1.0, -1.0]);
        }
    }

    #[test]
    fn test_pointwise_rejects_spatial_kernel() {
        let input = Tensor::zeros(Shape::nctv(1, 2, 1, 1));
        let weight = Tensor::zeros(Shape::conv(2, 2, 3, 1));
        let bias = Tensor::zeros(Shape::vector(2));
        let mut out = Tensor::zeros(Shape::nctv(1, 2, 1, 1));
        let err = pointwise_conv(&input.view(), &weight.view(), &bias.view(), &mut out, Kernel::Scalar);
        assert!(err.is_err());
    }
}
