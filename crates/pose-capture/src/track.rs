// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Replayable landmark tracks.
//!
//! A track stores what a detector saw in every native frame of a video, so
//! seeding can be reproduced without decoding or running a detector:
//!
//! ```json
//! { "fps": 30.0, "frames": [ [[x, y, z], ...33], null, ... ] }
//! ```
//!
//! `null` marks a frame in which nothing was detected.

use crate::{CaptureError, InMemoryVideo, LandmarkExtractor};
use pose_core::{JointTopology, Landmark, RawLandmarks};
use std::path::Path;

/// One recorded frame: the detected landmarks, or `None` for a miss.
pub type TrackFrame = Option<Vec<Landmark>>;

/// A recorded sequence of per-frame detections.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LandmarkTrack {
    /// Native frame rate of the recorded video; `0` means unknown.
    #[serde(default)]
    pub fps: f64,
    pub frames: Vec<TrackFrame>,
}

impl LandmarkTrack {
    pub fn new(fps: f64, frames: Vec<TrackFrame>) -> Self {
        Self { fps, frames }
    }

    /// Reads a track from a JSON file.
    ///
    /// # Errors
    /// [`CaptureError::SourceUnavailable`] if the file cannot be read,
    /// [`CaptureError::InvalidTrack`] if it is not a valid track.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let json = std::fs::read_to_string(path).map_err(|e| CaptureError::SourceUnavailable {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&json).map_err(|e| CaptureError::InvalidTrack(e.to_string()))
    }

    /// Writes the track as JSON.
    pub fn save(&self, path: &Path) -> Result<(), CaptureError> {
        let json =
            serde_json::to_string(self).map_err(|e| CaptureError::InvalidTrack(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| CaptureError::SourceUnavailable {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Number of frames with a detection.
    pub fn detections(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }

    /// Turns the track into a video source whose frames are the detections.
    pub fn into_source(self, label: impl Into<String>) -> InMemoryVideo<TrackFrame> {
        InMemoryVideo::with_label(self.frames, self.fps, label)
    }
}

/// Extractor that replays the detections stored in a [`LandmarkTrack`].
#[derive(Debug, Clone)]
pub struct TrackExtractor {
    topology: JointTopology,
}

impl TrackExtractor {
    pub fn new(topology: JointTopology) -> Self {
        Self { topology }
    }
}

impl Default for TrackExtractor {
    fn default() -> Self {
        Self::new(JointTopology::MEDIAPIPE_POSE)
    }
}

impl LandmarkExtractor<TrackFrame> for TrackExtractor {
    fn extract(&mut self, image: &TrackFrame) -> Result<Option<RawLandmarks>, CaptureError> {
        match image {
            None => Ok(None),
            Some(points) => Ok(Some(RawLandmarks::new(points.clone(), &self.topology)?)),
        }
    }

    fn name(&self) -> &str {
        "landmark-track"
    }
}
