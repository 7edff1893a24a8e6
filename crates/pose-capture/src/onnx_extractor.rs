// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! BlazePose-style landmark extraction with ONNX Runtime.
//!
//! The model takes a `[1, 256, 256, 3]` RGB image scaled to `[0, 1]` and
//! returns at least two outputs:
//!
//! - output 0: `[1, 195]` (or any shape of at least `33 × 5` values) holding
//!   `x, y, z, visibility, presence` per landmark in input-pixel units;
//! - output 1: a pose presence score.
//!
//! Coordinates are divided by the input size so they land in the same
//! normalised image space the predictor was trained on.

use crate::{CaptureError, LandmarkExtractor};
use ndarray::Array4;
use opencv::{
    core::{AlgorithmHint, Mat, Size, Vec3f, CV_32FC3},
    imgproc,
    prelude::*,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use pose_core::{JointTopology, Landmark, RawLandmarks};
use std::path::Path;

/// Square input resolution of the landmark model.
const INPUT_SIZE: i32 = 256;

/// Values per landmark in the first output.
const VALUES_PER_LANDMARK: usize = 5;

/// Presence scores below this are treated as "no person".
const PRESENCE_THRESHOLD: f32 = 0.5;

/// Landmark extractor backed by an ONNX pose-landmark model.
pub struct OnnxPoseExtractor {
    session: Session,
    input_name: String,
    landmarks_output: String,
    presence_output: Option<String>,
    topology: JointTopology,
}

impl OnnxPoseExtractor {
    /// Loads the model at `model_path`.
    ///
    /// # Errors
    /// [`CaptureError::ExtractorUnavailable`] if the model cannot be loaded
    /// or has no inputs/outputs.
    pub fn new(model_path: &Path, topology: JointTopology) -> Result<Self, CaptureError> {
        let unavailable = |e: ort::Error| {
            CaptureError::ExtractorUnavailable(format!("{}: {e}", model_path.display()))
        };
        let session = Session::builder()
            .map_err(unavailable)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(unavailable)?
            .commit_from_file(model_path)
            .map_err(unavailable)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| CaptureError::ExtractorUnavailable("model has no inputs".into()))?;
        let mut outputs = session.outputs.iter().map(|o| o.name.clone());
        let landmarks_output = outputs
            .next()
            .ok_or_else(|| CaptureError::ExtractorUnavailable("model has no outputs".into()))?;
        let presence_output = outputs.next();

        tracing::info!(
            model = %model_path.display(),
            input = %input_name,
            landmarks = %landmarks_output,
            presence = ?presence_output,
            "landmark model loaded"
        );
        Ok(Self {
            session,
            input_name,
            landmarks_output,
            presence_output,
            topology,
        })
    }

    fn preprocess(frame: &Mat) -> Result<Array4<f32>, CaptureError> {
        let cv = |e: opencv::Error| CaptureError::ExtractorUnavailable(e.to_string());

        let mut rgb = Mat::default();
        imgproc::cvt_color(
            frame,
            &mut rgb,
            imgproc::COLOR_BGR2RGB,
            0,
            AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(cv)?;

        let mut resized = Mat::default();
        imgproc::resize(
            &rgb,
            &mut resized,
            Size::new(INPUT_SIZE, INPUT_SIZE),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )
        .map_err(cv)?;

        let mut scaled = Mat::default();
        resized
            .convert_to(&mut scaled, CV_32FC3, 1.0 / 255.0, 0.0)
            .map_err(cv)?;

        let side = INPUT_SIZE as usize;
        let mut tensor = Array4::<f32>::zeros((1, side, side, 3));
        for y in 0..INPUT_SIZE {
            for x in 0..INPUT_SIZE {
                let px = scaled.at_2d::<Vec3f>(y, x).map_err(cv)?;
                for c in 0..3 {
                    tensor[[0, y as usize, x as usize, c]] = px[c];
                }
            }
        }
        Ok(tensor)
    }
}

/// Converts the raw landmark output into normalised image coordinates.
fn decode_landmarks(raw: &[f32], joints: usize) -> Option<Vec<Landmark>> {
    if raw.len() < joints * VALUES_PER_LANDMARK {
        return None;
    }
    let scale = INPUT_SIZE as f32;
    Some(
        raw.chunks_exact(VALUES_PER_LANDMARK)
            .take(joints)
            .map(|v| [v[0] / scale, v[1] / scale, v[2] / scale])
            .collect(),
    )
}

impl LandmarkExtractor<Mat> for OnnxPoseExtractor {
    fn extract(&mut self, image: &Mat) -> Result<Option<RawLandmarks>, CaptureError> {
        if image.empty() {
            return Ok(None);
        }
        let input = Self::preprocess(image)?;
        let run_err = |e: ort::Error| CaptureError::ExtractorUnavailable(e.to_string());

        let input_tensor = Tensor::from_array(input).map_err(run_err)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(run_err)?;

        if let Some(name) = &self.presence_output {
            let presence: ndarray::ArrayViewD<f32> =
                outputs[name.as_str()].try_extract_array().map_err(run_err)?;
            let score = presence.iter().next().copied().unwrap_or(0.0);
            if score < PRESENCE_THRESHOLD {
                return Ok(None);
            }
        }

        let landmarks: ndarray::ArrayViewD<f32> = outputs[self.landmarks_output.as_str()]
            .try_extract_array()
            .map_err(run_err)?;
        let raw: Vec<f32> = landmarks.iter().copied().collect();
        let Some(points) = decode_landmarks(&raw, self.topology.num_joints) else {
            return Err(CaptureError::ExtractorUnavailable(format!(
                "landmark output has {} values, need {}",
                raw.len(),
                self.topology.num_joints * VALUES_PER_LANDMARK
            )));
        };
        Ok(Some(RawLandmarks::new(points, &self.topology)?))
    }

    fn name(&self) -> &str {
        "onnx-pose"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_landmarks_scales_to_unit() {
        let raw: Vec<f32> = (0..33)
            .flat_map(|_| [128.0, 64.0, 256.0, 1.0, 1.0])
            .collect();
        let pts = decode_landmarks(&raw, 33).unwrap();
        assert_eq!(pts.len(), 33);
        assert_eq!(pts[0], [0.5, 0.25, 1.0]);
    }

    #[test]
    fn test_decode_landmarks_too_short() {
        assert!(decode_landmarks(&[0.0; 100], 33).is_none());
    }

    #[test]
    fn test_missing_model() {
        let result = OnnxPoseExtractor::new(
            Path::new("/nonexistent/pose_landmark.onnx"),
            JointTopology::MEDIAPIPE_POSE,
        );
        assert!(matches!(result, Err(CaptureError::ExtractorUnavailable(_))));
    }
}
