// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! OpenCV video file decoding.

use crate::{CaptureError, VideoSource};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::Path;

/// A video file decoded frame by frame with OpenCV. Frames are BGR [`Mat`]s.
pub struct OpenCvVideo {
    capture: VideoCapture,
    path: String,
    fps: f64,
    frame_count: Option<usize>,
    read: usize,
}

impl OpenCvVideo {
    /// Opens `path` for sequential decoding.
    ///
    /// # Errors
    /// [`CaptureError::SourceUnavailable`] if the file is missing or no
    /// backend can open it.
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let name = path.display().to_string();
        let unavailable = |reason: String| CaptureError::SourceUnavailable {
            source_name: name.clone(),
            reason,
        };
        if !path.is_file() {
            return Err(unavailable("file not found".into()));
        }

        let capture = VideoCapture::from_file(&name, videoio::CAP_ANY)
            .map_err(|e| unavailable(e.to_string()))?;
        if !capture.is_opened().map_err(|e| unavailable(e.to_string()))? {
            return Err(unavailable("no backend could open the file".into()));
        }

        let fps = capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.0);
        let frame_count = capture
            .get(videoio::CAP_PROP_FRAME_COUNT)
            .ok()
            .filter(|n| n.is_finite() && *n > 0.0)
            .map(|n| n as usize);

        tracing::info!(path = %name, fps, frames = ?frame_count, "opened video");
        Ok(Self {
            capture,
            path: name,
            fps,
            frame_count,
            read: 0,
        })
    }
}

impl VideoSource for OpenCvVideo {
    type Frame = Mat;

    fn native_fps(&self) -> f64 {
        self.fps
    }

    fn frame_count_hint(&self) -> Option<usize> {
        self.frame_count
    }

    fn read_frame(&mut self) -> Result<Option<Mat>, CaptureError> {
        let mut frame = Mat::default();
        let ok = self
            .capture
            .read(&mut frame)
            .map_err(|e| CaptureError::Decode {
                index: self.read,
                reason: e.to_string(),
            })?;
        if !ok || frame.empty() {
            return Ok(None);
        }
        self.read += 1;
        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = OpenCvVideo::open(Path::new("/nonexistent/seed.mp4"))
            .err()
            .unwrap();
        assert!(matches!(err, CaptureError::SourceUnavailable { .. }));
    }
}
