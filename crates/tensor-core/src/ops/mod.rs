// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor arithmetic operations.
//!
//! Each operation works on pre-allocated output buffers to avoid heap
//! allocations in the inference hot path. Inner products dispatch on a
//! [`Kernel`] chosen once per run by the runtime's device probe.

mod batch_norm_op;
mod linear_op;
mod pointwise_op;
mod pool_op;
mod relu_op;
mod temporal_conv_op;

pub use batch_norm_op::{batch_norm, BatchNormParams};
pub use linear_op::linear;
pub use pointwise_op::pointwise_conv;
pub use pool_op::global_avg_pool;
pub use relu_op::relu_inplace;
pub use temporal_conv_op::temporal_conv;

/// Selects the inner-loop implementation used by the kernels.
///
/// Both variants compute the same function; `Wide` reorders the summation
/// into eight lanes, so results may differ from `Scalar` in the last ulp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    /// Portable sequential loop.
    #[default]
    Scalar,
    /// Eight independent accumulators, auto-vectorised on SIMD targets.
    Wide,
}

impl Kernel {
    /// Returns a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Kernel::Scalar => "scalar",
            Kernel::Wide => "wide",
        }
    }
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const LANES: usize = 8;

/// Inner product of two equal-length slices.
#[inline]
pub(crate) fn dot(kernel: Kernel, a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    match kernel {
        Kernel::Scalar => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        Kernel::Wide => {
            let mut acc = [0.0f32; LANES];
            let chunks = a.len() / LANES;
            for i in 0..chunks {
                let base = i * LANES;
                let xa = &a[base..base + LANES];
                let xb = &b[base..base + LANES];
                for l in 0..LANES {
                    acc[l] += xa[l] * xb[l];
                }
            }
            let mut tail = 0.0f32;
            for i in chunks * LANES..a.len() {
                tail += a[i] * b[i];
            }
            acc.iter().sum::<f32>() + tail
        }
    }
}

/// `y += alpha * x` over equal-length slices.
#[inline]
pub(crate) fn axpy(kernel: Kernel, alpha: f32, x: &[f32], y: &mut [f32]) {
    debug_assert_eq!(x.len(), y.len());
    match kernel {
        Kernel::Scalar => {
            for (yi, xi) in y.iter_mut().zip(x) {
                *yi += alpha * xi;
            }
        }
        Kernel::Wide => {
            let mut ys = y.chunks_exact_mut(LANES);
            let mut xs = x.chunks_exact(LANES);
            for (yc, xc) in (&mut ys).zip(&mut xs) {
                for l in 0..LANES {
                    yc[l] += alpha * xc[l];
                }
            }
            for (yi, xi) in ys.into_remainder().iter_mut().zip(xs.remainder()) {
                *yi += alpha * xi;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_kernels_agree() {
        let a: Vec<f32> = (0..19).map(|i| i as f32 * 0.5).collect();
        let b: Vec<f32> = (0..19).map(|i| 1.0 - i as f32 * 0.1).collect();
        let s = dot(Kernel::Scalar, &a, &b);
        let w = dot(Kernel::Wide, &a, &b);
        assert!((s - w).abs() < 1e-4, "scalar={s} wide={w}");
    }

    #[test]
    fn test_axpy_kernels_agree() {
        let x: Vec<f32> = (0..13).map(|i| i as f32).collect();
        let mut y1 = vec![1.0f32; 13];
        let mut y2 = vec![1.0f32; 13];
        axpy(Kernel::Scalar, 2.0, &x, &mut y1);
        axpy(Kernel::Wide, 2.0, &x, &mut y2);
        assert_eq!(y1, y2);
        assert_eq!(y1[12], 25.0);
    }

    #[test]
    fn test_kernel_display() {
        assert_eq!(Kernel::Wide.to_string(), "wide");
        assert_eq!(Kernel::default(), Kernel::Scalar);
    }
}
