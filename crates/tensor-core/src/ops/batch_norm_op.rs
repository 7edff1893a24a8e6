// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Inference-mode batch normalisation.

use crate::{Tensor, TensorError, TensorView};

/// Per-channel affine transform folded from batch-norm running statistics.
///
/// `y = (x - mean) / sqrt(var + eps) * gamma + beta` is stored as
/// `y = x * scale + shift`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchNormParams {
    scale: Vec<f32>,
    shift: Vec<f32>,
}

impl BatchNormParams {
    /// Folds `gamma`, `beta`, running mean and running variance.
    ///
    /// # Errors
    /// All four slices must have the same length.
    pub fn fold(
        gamma: &[f32],
        beta: &[f32],
        mean: &[f32],
        var: &[f32],
        eps: f32,
    ) -> Result<Self, TensorError> {
        let c = gamma.len();
        for len in [beta.len(), mean.len(), var.len()] {
            if len != c {
                return Err(TensorError::BufferSizeMismatch {
                    expected: c,
                    actual: len,
                });
            }
        }
        let scale: Vec<f32> = gamma
            .iter()
            .zip(var)
            .map(|(g, v)| g / (v + eps).sqrt())
            .collect();
        let shift = beta
            .iter()
            .zip(mean)
            .zip(&scale)
            .map(|((b, m), s)| b - m * s)
            .collect();
        Ok(Self { scale, shift })
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.scale.len()
    }

    /// Per-channel multiplier.
    pub fn scale(&self) -> &[f32] {
        &self.scale
    }

    /// Per-channel offset.
    pub fn shift(&self) -> &[f32] {
        &self.shift
    }
}

/// Applies folded batch normalisation to `[N, C, T, V]` activations.
///
/// # Errors
/// Returns [`TensorError::RankMismatch`] for non rank-4 input and
/// [`TensorError::ShapeMismatch`] if channels or output shape disagree.
pub fn batch_norm(
    input: &TensorView<'_>,
    params: &BatchNormParams,
    output: &mut Tensor,
) -> Result<(), TensorError> {
    let (n, c, t_len, v) = input.shape().as_nctv().ok_or_else(|| TensorError::RankMismatch {
        op: "batch_norm",
        expected: 4,
        actual: input.shape().clone(),
    })?;
    if c != params.channels() || output.shape() != input.shape() {
        return Err(TensorError::ShapeMismatch {
            op: "batch_norm",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let plane = t_len * v;
    let x = input.as_slice();
    let out = output.as_mut_slice();
    for batch in 0..n {
        for ch in 0..c {
            let base = (batch * c + ch) * plane;
            let (s, b) = (params.scale[ch], params.shift[ch]);
            for (o, &xi) in out[base..base + plane].iter_mut().zip(&x[base..base + plane]) {
                *o = xi * s + b;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    #[test]
    fn test_identity_statistics() {
        let params = BatchNormParams::fold(&[1.0], &[0.0], &[0.0], &[1.0], 0.0).unwrap();
        let input = Tensor::from_f32(Shape::nctv(1, 1, 1, 3), &[1.0, -2.0, 3.0]).unwrap();
        let mut out = Tensor::zeros(Shape::nctv(1, 1, 1, 3));
        batch_norm(&input.view(), &params, &mut out).unwrap();
        assert_eq!(out.as_slice(), input.as_slice());
    }

    #[test]
    fn test_normalises_per_channel() {
        // Channel 0: mean 2, var 4, gamma 1, beta 0 → (x - 2) / 2
        // Channel 1: mean 0, var 1, gamma 3, beta 1 → 3x + 1
        let params =
            BatchNormParams::fold(&[1.0, 3.0], &[0.0, 1.0], &[2.0, 0.0], &[4.0, 1.0], 0.0).unwrap();
        let input = Tensor::from_f32(Shape::nctv(1, 2, 1, 2), &[4.0, 0.0, 1.0, -1.0]).unwrap();
        let mut out = Tensor::zeros(Shape::nctv(1, 2, 1, 2));
        batch_norm(&input.view(), &params, &mut out).unwrap();
        assert_eq!(out.as_slice(), &[1.0, -1.0, 4.0, -2.0]);
    }

    #[test]
    fn test_eps_is_applied() {
        let params = BatchNormParams::fold(&[1.0], &[0.0], &[0.0], &[0.0], 1e-5).unwrap();
        assert!((params.scale()[0] - 1.0 / 1e-5f32.sqrt()).abs() < 1.0);
    }

    #[test]
    fn test_fold_length_mismatch() {
        let err = BatchNormParams::fold(&[1.0, 1.0], &[0.0], &[0.0, 0.0], &[1.0, 1.0], 1e-5);
        assert!(matches!(err, Err(TensorError::BufferSizeMismatch { expected: 2, actual: 1 })));
    }
}
