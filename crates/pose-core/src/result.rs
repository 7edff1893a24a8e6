// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Persisted generation result.
//!
//! # Format
//! ```json
//! {
//!   "video_path": "seed.mp4",
//!   "seed_frames": 32,
//!   "generated_frames": 100,
//!   "total_frames": 132,
//!   "pose_dimension": 99,
//!   "poses": [[0.0, 0.1, ...], ...]
//! }
//! ```
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! failed save never leaves a partial document behind.

use crate::{PoseError, PoseVector, COORDS_PER_JOINT};
use std::io::Write;
use std::path::Path;

/// Immutable output of one generation run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    video_path: Option<String>,
    seed_frames: usize,
    generated_frames: usize,
    total_frames: usize,
    pose_dimension: usize,
    poses: Vec<PoseVector>,
}

impl GenerationResult {
    pub(crate) fn from_parts(
        video_path: Option<String>,
        seed_frames: usize,
        pose_dimension: usize,
        poses: Vec<PoseVector>,
    ) -> Self {
        Self {
            video_path,
            seed_frames,
            generated_frames: poses.len() - seed_frames,
            total_frames: poses.len(),
            pose_dimension,
            poses,
        }
    }

    pub fn video_path(&self) -> Option<&str> {
        self.video_path.as_deref()
    }

    pub fn seed_frames(&self) -> usize {
        self.seed_frames
    }

    pub fn generated_frames(&self) -> usize {
        self.generated_frames
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn pose_dimension(&self) -> usize {
        self.pose_dimension
    }

    pub fn poses(&self) -> &[PoseVector] {
        &self.poses
    }

    /// Only the predicted poses.
    pub fn generated(&self) -> &[PoseVector] {
        &self.poses[self.seed_frames.min(self.poses.len())..]
    }

    /// Un-flattened joints of frame `index`.
    pub fn joints(&self, index: usize) -> Option<Vec<[f32; 3]>> {
        self.poses.get(index).map(PoseVector::to_joints)
    }

    /// Checks that the metadata agrees with the poses.
    pub fn validate(&self) -> Result<(), PoseError> {
        let inconsistent = |msg: String| Err(PoseError::InconsistentResult(msg));
        if self.total_frames != self.poses.len() {
            return inconsistent(format!(
                "total_frames {} but {} poses",
                self.total_frames,
                self.poses.len()
            ));
        }
        if self.seed_frames + self.generated_frames != self.total_frames {
            return inconsistent(format!(
                "seed_frames {} + generated_frames {} != total_frames {}",
                self.seed_frames, self.generated_frames, self.total_frames
            ));
        }
        if self.pose_dimension % COORDS_PER_JOINT != 0 {
            return inconsistent(format!(
                "pose_dimension {} is not a multiple of {COORDS_PER_JOINT}",
                self.pose_dimension
            ));
        }
        if let Some((i, p)) = self
            .poses
            .iter()
            .enumerate()
            .find(|(_, p)| p.len() != self.pose_dimension)
        {
            return inconsistent(format!(
                "pose {i} has {} values, expected {}",
                p.len(),
                self.pose_dimension
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PoseError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses and validates a result document.
    pub fn from_json(json: &str) -> Result<Self, PoseError> {
        let result: Self = serde_json::from_str(json)?;
        result.validate()?;
        Ok(result)
    }

    /// Loads and validates a result file.
    pub fn load(path: &Path) -> Result<Self, PoseError> {
        let json = std::fs::read_to_string(path).map_err(|source| PoseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Writes the result atomically: temp file in the target directory,
    /// flushed, then renamed over `path`.
    pub fn save(&self, path: &Path) -> Result<(), PoseError> {
        let io_err = |source| PoseError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let json = self.to_json()?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        tracing::info!(
            path = %path.display(),
            total_frames = self.total_frames,
            "generation result saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratedSequence;

    fn sample(seed: usize, generated: usize) -> GenerationResult {
        let seed_poses: Vec<PoseVector> = (0..seed)
            .map(|t| PoseVector::new((0..99).map(|i| (t * 99 + i) as f32 * 0.013 - 0.7).collect()))
            .collect();
        let mut seq = GeneratedSequence::from_seed(&seed_poses, generated).unwrap();
        for g in 0..generated {
            seq.push_prediction(PoseVector::new(vec![1.0 / (g as f32 + 3.0); 99]))
                .unwrap();
        }
        seq.finish(None)
    }

    #[test]
    fn test_json_roundtrip_is_exact() {
        let result = sample(4, 3);
        let back = GenerationResult::from_json(&result.to_json().unwrap()).unwrap();
        assert_eq!(back, result);
        assert_eq!(back.joints(1), result.joints(1));
    }

    #[test]
    fn test_video_path_omitted_when_absent() {
        let json = sample(1, 0).to_json().unwrap();
        assert!(!json.contains("video_path"));
        assert!(json.contains("\"pose_dimension\":99"));
    }

    #[test]
    fn test_inconsistent_counts_rejected() {
        let json = r#"{"seed_frames":1,"generated_frames":1,"total_frames":3,
                       "pose_dimension":3,"poses":[[0,0,0],[1,1,1]]}"#;
        assert!(matches!(
            GenerationResult::from_json(json),
            Err(PoseError::InconsistentResult(_))
        ));
    }

    #[test]
    fn test_ragged_pose_rejected() {
        let json = r#"{"seed_frames":1,"generated_frames":1,"total_frames":2,
                       "pose_dimension":3,"poses":[[0,0,0],[1,1]]}"#;
        assert!(GenerationResult::from_json(json).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated_poses.json");
        let result = sample(3, 2);
        result.save(&path).unwrap();
        let loaded = GenerationResult::load(&path).unwrap();
        assert_eq!(loaded, result);
        assert_eq!(loaded.generated().len(), 2);
        // Only the target file remains in the directory.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        assert!(matches!(sample(1, 1).save(&path), Err(PoseError::Io { .. })));
        assert!(!path.exists());
    }
}
