// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Temporal convolution over `(N, C, T, V)` activations.
//!
//! The kernel spans `kt` frames and a single joint, is applied with stride 1
//! and zero "same" padding of `(kt - 1) / 2` frames on each side, so the
//! output keeps the input's time length.
//!
//! ```text
//!   out[n, co, t, v] = bias[co]
//!       + Σ_ci Σ_k  w[co, ci, k, 0] · in[n, ci, t + k - pad, v]
//! ```

use super::{axpy, Kernel};
use crate::{Shape, Tensor, TensorError, TensorView};

/// Applies a `(kt × 1)` convolution along the time axis.
///
/// - `input`: `[N, C_in, T, V]`
/// - `weight`: `[C_out, C_in, kt, 1]` with odd `kt`
/// - `bias`: `[C_out]`
/// - `output`: `[N, C_out, T, V]`
///
/// # Errors
/// Returns [`TensorError::RankMismatch`] for non rank-4 activations and
/// [`TensorError::ShapeMismatch`] when channel counts or the kernel
/// geometry disagree.
pub fn temporal_conv(
    input: &TensorView<'_>,
    weight: &TensorView<'_>,
    bias: &TensorView<'_>,
    output: &mut Tensor,
    kernel: Kernel,
) -> Result<(), TensorError> {
    let (n, c_in, t_len, v) = input.shape().as_nctv().ok_or_else(|| TensorError::RankMismatch {
        op: "temporal_conv",
        expected: 4,
        actual: input.shape().clone(),
    })?;
    let (c_out, kt) = match weight.shape().dims() {
        &[co, ci, kt, 1] if ci == c_in && kt % 2 == 1 => (co, kt),
        _ => {
            return Err(TensorError::ShapeMismatch {
                op: "temporal_conv (weight)",
                lhs: input.shape().clone(),
                rhs: weight.shape().clone(),
            })
        }
    };
    if bias.shape().dims() != [c_out] {
        return Err(TensorError::ShapeMismatch {
            op: "temporal_conv (bias)",
            lhs: Shape::vector(c_out),
            rhs: bias.shape().clone(),
        });
    }
    let expected = Shape::nctv(n, c_out, t_len, v);
    if output.shape() != &expected {
        return Err(TensorError::ShapeMismatch {
            op: "temporal_conv (output)",
            lhs: expected,
            rhs: output.shape().clone(),
        });
    }

    let pad = (kt - 1) / 2;
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
                for k in 0..kt {
                    let wk = w[(co * c_in + ci) * kt + k];
                    // Output frames whose source frame t + k - pad is in range.
                    let t_lo = pad.saturating_sub(k);
                    let t_hi = (t_len + pad).saturating_sub(k).min(t_len);
                    if t_lo >= t_hi {
                        continue;
                    }
                    let s_lo = t_lo + k - pad;
                    let rows = t_hi - t_lo;
                    axpy(
                        kernel,
                        wk,
                        &src[s_lo * v..(s_lo + rows) * v],
                        &mut dst[t_lo * v..t_hi * v],
                    );
                }
            }
        }
    }
    Ok(())
}
