// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Raw landmark sets as produced by a detector.

use crate::{JointTopology, PoseError};

/// A single estimated 3D keypoint `[x, y, z]`.
pub type Landmark = [f32; 3];

/// One frame's landmarks, exactly one per topology joint.
///
/// Produced per detected frame and consumed straight away by the
/// normaliser; never persisted raw.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLandmarks {
    points: Vec<Landmark>,
}

impl RawLandmarks {
    /// Wraps `points` after checking the count against `topology`.
    pub fn new(points: Vec<Landmark>, topology: &JointTopology) -> Result<Self, PoseError> {
        if points.len() != topology.num_joints {
            return Err(PoseError::LandmarkCount {
                expected: topology.num_joints,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    /// Builds a landmark set from joint-major `[x, y, z, x, y, z, …]` values.
    pub fn from_flat(values: &[f32], topology: &JointTopology) -> Result<Self, PoseError> {
        if values.len() != topology.pose_dim() {
            return Err(PoseError::DimensionMismatch {
                expected: topology.pose_dim(),
                actual: values.len(),
            });
        }
        let points = values
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the landmark at `joint`, if present.
    pub fn get(&self, joint: usize) -> Option<Landmark> {
        self.points.get(joint).copied()
    }

    /// Multiplies every coordinate by `k`.
    pub fn scaled(&self, k: f32) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| [p[0] * k, p[1] * k, p[2] * k])
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_count_rejected() {
        let err = RawLandmarks::new(vec![[0.0; 3]; 32], &JointTopology::MEDIAPIPE_POSE);
        assert!(matches!(
            err,
            Err(PoseError::LandmarkCount { expected: 33, actual: 32 })
        ));
    }

    #[test]
    fn test_from_flat_is_joint_major() {
        let values: Vec<f32> = (0..99).map(|i| i as f32).collect();
        let lm = RawLandmarks::from_flat(&values, &JointTopology::MEDIAPIPE_POSE).unwrap();
        assert_eq!(lm.get(0), Some([0.0, 1.0, 2.0]));
        assert_eq!(lm.get(32), Some([96.0, 97.0, 98.0]));
        assert_eq!(lm.get(33), None);
    }

    #[test]
    fn test_scaled() {
        let lm = RawLandmarks::new(vec![[1.0, -2.0, 0.5]; 33], &JointTopology::MEDIAPIPE_POSE)
            .unwrap();
        assert_eq!(lm.scaled(2.0).get(5), Some([2.0, -4.0, 1.0]));
    }
}
