// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # pose-capture
//!
//! Turns a seed video into the fixed-length window of normalised poses the
//! predictor is primed with.
//!
//! ```text
//! VideoSource ─▶ FrameSampler ─▶ LandmarkExtractor ─▶ normalize ─▶ SeedBuilder
//!   (decode)      (stride)         (detect / miss)      (pose-core)   (first L)
//! ```
//!
//! - [`VideoSource`] / [`FrameSampler`] — lazy, decimated frame iteration.
//! - [`LandmarkExtractor`] — per-frame detection; a miss is `Ok(None)`.
//! - [`LandmarkTrack`] — a replayable JSON recording of detections.
//! - [`SeedBuilder`] — collects the first `seq_len` valid poses.
//!
//! # Features
//! - `opencv` — [`OpenCvVideo`] decodes video files.
//! - `onnx` — [`OnnxPoseExtractor`] runs a landmark model with ONNX Runtime.

mod error;
mod extractor;
mod sampler;
mod seed;
mod track;

#[cfg(feature = "onnx")]
mod onnx_extractor;
#[cfg(feature = "opencv")]
mod opencv_source;

pub use error::CaptureError;
pub use extractor::LandmarkExtractor;
pub use sampler::{
    stride_for, FrameSampler, InMemoryVideo, SampledFrame, VideoSource, DEFAULT_NATIVE_FPS,
};
pub use seed::{SeedBuilder, SeedReport, SeedSequence};
pub use track::{LandmarkTrack, TrackExtractor, TrackFrame};

#[cfg(feature = "onnx")]
pub use onnx_extractor::OnnxPoseExtractor;
#[cfg(feature = "opencv")]
pub use opencv_source::OpenCvVideo;

/// Names of the capture backends compiled into this build.
pub fn enabled_backends() -> Vec<&'static str> {
    let mut backends = vec!["landmark-track"];
    if cfg!(feature = "opencv") {
        backends.push("opencv");
    }
    if cfg!(feature = "onnx") {
        backends.push("onnx");
    }
    backends
}
