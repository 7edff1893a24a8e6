// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Translation- and scale-invariant pose vectors.
//!
//! ```text
//! hip_mid      = (hip_l + hip_r) / 2
//! shoulder_mid = (shoulder_l + shoulder_r) / 2
//! torso        = ‖shoulder_mid − hip_mid‖₂        (1.0 if < 1e-6)
//! out[j]       = (p[j] − hip_mid) / torso          flattened joint-major
//! ```
//!
//! A degenerate torso keeps the centred coordinates unscaled. That changes
//! the magnitude of the whole frame without any marker in the vector itself,
//! so [`NormalizedPose::degenerate`] carries the signal for callers.
//!
//! Intermediates are computed in `f64` and narrowed once per component, so
//! a result can differ from an all-`f32` evaluation in the last ulp.

use crate::{JointTopology, PoseError, RawLandmarks, COORDS_PER_JOINT};

/// Torso lengths below this are treated as degenerate.
pub const TORSO_EPSILON: f64 = 1e-6;

/// A flattened, joint-major pose vector (`num_joints × 3` values).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PoseVector(Vec<f32>);

impl PoseVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// All-zero vector of the given dimension.
    pub fn zeros(dim: usize) -> Self {
        Self(vec![0.0; dim])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Un-flattens into `(joints, 3)`; the inverse of the flattening step.
    pub fn to_joints(&self) -> Vec<[f32; 3]> {
        self.0
            .chunks_exact(COORDS_PER_JOINT)
            .map(|c| [c[0], c[1], c[2]])
            .collect()
    }

    /// Returns `true` if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<Vec<f32>> for PoseVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPose {
    /// The normalised vector.
    pub vector: PoseVector,
    /// Torso length actually used as the divisor.
    pub torso_length: f32,
    /// `true` when the measured torso was below [`TORSO_EPSILON`] and the
    /// divisor fell back to 1.0.
    pub degenerate: bool,
}

/// Centres `landmarks` on the hip midpoint and scales by torso length.
///
/// # Errors
/// Returns [`PoseError::LandmarkCount`] if `landmarks` was built for a
/// different topology.
pub fn normalize(
    landmarks: &RawLandmarks,
    topology: &JointTopology,
) -> Result<NormalizedPose, PoseError> {
    if landmarks.len() != topology.num_joints || !topology.is_consistent() {
        return Err(PoseError::LandmarkCount {
            expected: topology.num_joints,
            actual: landmarks.len(),
        });
    }
    let points = landmarks.points();
    let widen = |j: usize| points[j].map(f64::from);
    let midpoint = |a: [f64; 3], b: [f64; 3]| {
        [
            (a[0] + b[0]) / 2.0,
            (a[1] + b[1]) / 2.0,
            (a[2] + b[2]) / 2.0,
        ]
    };

    let hip_mid = midpoint(widen(topology.left_hip), widen(topology.right_hip));
    let shoulder_mid = midpoint(
        widen(topology.left_shoulder),
        widen(topology.right_shoulder),
    );

    let measured = (0..3)
        .map(|i| (shoulder_mid[i] - hip_mid[i]).powi(2))
        .sum::<f64>()
        .sqrt();
    let degenerate = measured.is_nan() || measured < TORSO_EPSILON;
    let torso = if degenerate { 1.0 } else { measured };
    if degenerate {
        tracing::debug!(torso = measured, "degenerate torso, keeping unscaled coordinates");
    }

    let mut out = Vec::with_capacity(topology.pose_dim());
    for p in points {
        for (c, &v) in p.iter().enumerate() {
            out.push(((f64::from(v) - hip_mid[c]) / torso) as f32);
        }
    }

    Ok(NormalizedPose {
        vector: PoseVector(out),
        torso_length: torso as f32,
        degenerate,
    })
}

/// [`normalize`] lifted over an optional detection.
pub fn normalize_opt(
    landmarks: Option<&RawLandmarks>,
    topology: &JointTopology,
) -> Result<Option<NormalizedPose>, PoseError> {
    landmarks.map(|lm| normalize(lm, topology)).transpose()
}
