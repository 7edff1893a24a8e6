// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for capture and seeding.

/// Errors raised while sampling frames or building a seed sequence.
///
/// A missed detection is not an error; extractors report it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The video (or landmark track) could not be opened.
    #[error("video source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// A frame could not be decoded after the source was opened.
    #[error("failed to decode frame {index}: {reason}")]
    Decode { index: usize, reason: String },

    /// The requested processing rate is not a positive, finite number.
    #[error("invalid sampling rate {0} (must be > 0)")]
    InvalidSamplingRate(f64),

    /// The landmark detector failed to initialise or to run.
    #[error("landmark extractor unavailable: {0}")]
    ExtractorUnavailable(String),

    /// The whole video produced fewer valid poses than the model needs.
    #[error("insufficient seed data: found {found} valid poses, need {required}")]
    InsufficientSeedData { found: usize, required: usize },

    /// A landmark track file is malformed.
    #[error("invalid landmark track: {0}")]
    InvalidTrack(String),

    /// Seeding was cancelled before enough poses were collected.
    #[error("seed extraction cancelled")]
    Cancelled,

    /// A detection did not fit the joint topology.
    #[error(transparent)]
    Pose(#[from] pose_core::PoseError),
}
