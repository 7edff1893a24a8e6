// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for pose data.

/// Errors raised while constructing or persisting pose data.
#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    /// A landmark set does not have one point per topology joint.
    #[error("expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    /// A pose vector has the wrong length for its container.
    #[error("pose dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A window was seeded with the wrong number of poses.
    #[error("pose window needs exactly {capacity} seed poses, got {actual}")]
    SeedLength { capacity: usize, actual: usize },

    /// A window of zero capacity was requested.
    #[error("pose window capacity must be >= 1")]
    EmptyWindow,

    /// A persisted result's metadata disagrees with its poses.
    #[error("inconsistent generation result: {0}")]
    InconsistentResult(String),

    /// A result file could not be read or written.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A result document is not valid JSON.
    #[error("invalid result JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Building the model input tensor failed.
    #[error(transparent)]
    Tensor(#[from] tensor_core::TensorError),
}
