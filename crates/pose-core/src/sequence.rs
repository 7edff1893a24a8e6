// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Append-only record of a generation run: seed first, then predictions.

use crate::{GenerationResult, PoseError, PoseVector};

/// Seed poses followed by every prediction, in order.
///
/// Only predictions can be appended; the seed prefix is fixed at
/// construction. [`Self::finish`] freezes the sequence into a
/// [`GenerationResult`].
#[derive(Debug, Clone)]
pub struct GeneratedSequence {
    poses: Vec<PoseVector>,
    seed_len: usize,
    dim: usize,
}

impl GeneratedSequence {
    /// Starts a sequence from the seed window, reserving room for `expected`
    /// predictions.
    pub fn from_seed(seed: &[PoseVector], expected: usize) -> Result<Self, PoseError> {
        let dim = seed.first().map(PoseVector::len).unwrap_or(0);
        if let Some(bad) = seed.iter().find(|p| p.len() != dim) {
            return Err(PoseError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }
        let mut poses = Vec::with_capacity(seed.len() + expected);
        poses.extend_from_slice(seed);
        Ok(Self {
            poses,
            seed_len: seed.len(),
            dim,
        })
    }

    /// Appends one prediction.
    pub fn push_prediction(&mut self, pose: PoseVector) -> Result<(), PoseError> {
        if pose.len() != self.dim {
            return Err(PoseError::DimensionMismatch {
                expected: self.dim,
                actual: pose.len(),
            });
        }
        self.poses.push(pose);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn seed_len(&self) -> usize {
        self.seed_len
    }

    pub fn generated_len(&self) -> usize {
        self.poses.len() - self.seed_len
    }

    pub fn pose_dim(&self) -> usize {
        self.dim
    }

    /// The most recent pose (last prediction, or last seed pose).
    pub fn last(&self) -> Option<&PoseVector> {
        self.poses.last()
    }

    pub fn poses(&self) -> &[PoseVector] {
        &self.poses
    }

    /// Freezes the sequence into its result document.
    pub fn finish(self, video_path: Option<String>) -> GenerationResult {
        GenerationResult::from_parts(video_path, self.seed_len, self.dim, self.poses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths_track_predictions() {
        let seed = vec![PoseVector::zeros(6); 4];
        let mut seq = GeneratedSequence::from_seed(&seed, 3).unwrap();
        assert_eq!((seq.len(), seq.seed_len(), seq.generated_len()), (4, 4, 0));
        for i in 0..3 {
            seq.push_prediction(PoseVector::new(vec![i as f32; 6])).unwrap();
        }
        assert_eq!((seq.len(), seq.generated_len()), (7, 3));
        assert_eq!(seq.last().unwrap().as_slice()[0], 2.0);
    }

    #[test]
    fn test_rejects_wrong_dimension() {
        let mut seq = GeneratedSequence::from_seed(&[PoseVector::zeros(6)], 1).unwrap();
        assert!(seq.push_prediction(PoseVector::zeros(5)).is_err());
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_finish_carries_metadata() {
        let seed = vec![PoseVector::zeros(99); 2];
        let mut seq = GeneratedSequence::from_seed(&seed, 1).unwrap();
        seq.push_prediction(PoseVector::zeros(99)).unwrap();
        let result = seq.finish(Some("clip.mp4".into()));
        assert_eq!(result.seed_frames(), 2);
        assert_eq!(result.generated_frames(), 1);
        assert_eq!(result.total_frames(), 3);
        assert_eq!(result.pose_dimension(), 99);
        assert_eq!(result.video_path(), Some("clip.mp4"));
    }
}
