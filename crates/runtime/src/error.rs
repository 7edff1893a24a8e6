// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the generation runtime.

use pose_capture::CaptureError;
use std::path::PathBuf;

/// Errors that can occur while loading the pipeline or generating poses.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Invalid or unreadable runtime configuration.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The checkpoint is missing, corrupt or disagrees with its config.
    #[error("model error: {0}")]
    ModelError(#[from] model_ir::ModelError),

    /// A weight tensor could not be materialised.
    #[error("weight loading failed for '{name}': {detail}")]
    WeightLoadError { name: String, detail: String },

    /// An optional auxiliary model file exists but cannot be used.
    #[error("auxiliary model '{}' is invalid: {detail}", path.display())]
    AuxiliaryModel { path: PathBuf, detail: String },

    /// A tensor operation failed inside a model stage.
    #[error("execution error in stage '{stage}': {source}")]
    ExecutionError {
        stage: String,
        #[source]
        source: tensor_core::TensorError,
    },

    /// Seed capture failed.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Pose bookkeeping failed (window, sequence or result).
    #[error(transparent)]
    Pose(#[from] pose_core::PoseError),

    /// The run was cancelled between steps.
    #[error("generation cancelled")]
    Cancelled,
}

/// Coarse failure category, used for exit codes and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Missing or broken model files, unreadable input, bad configuration.
    Setup,
    /// The seed video had too few usable frames.
    DataInsufficiency,
    /// The user aborted the run.
    Cancelled,
    /// Anything else; indicates a bug or an inconsistent checkpoint.
    Internal,
}

impl ErrorClass {
    /// Process exit code for this class.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorClass::Setup => 2,
            ErrorClass::DataInsufficiency => 3,
            ErrorClass::Cancelled => 130,
            ErrorClass::Internal => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Setup => "setup",
            ErrorClass::DataInsufficiency => "data_insufficiency",
            ErrorClass::Cancelled => "cancelled",
            ErrorClass::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RuntimeError {
    /// Classifies the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            RuntimeError::ConfigError(_)
            | RuntimeError::ModelError(_)
            | RuntimeError::WeightLoadError { .. }
            | RuntimeError::AuxiliaryModel { .. } => ErrorClass::Setup,
            RuntimeError::Capture(e) => match e {
                CaptureError::InsufficientSeedData { .. } => ErrorClass::DataInsufficiency,
                CaptureError::Cancelled => ErrorClass::Cancelled,
                CaptureError::Pose(_) => ErrorClass::Internal,
                CaptureError::SourceUnavailable { .. }
                | CaptureError::Decode { .. }
                | CaptureError::InvalidSamplingRate(_)
                | CaptureError::ExtractorUnavailable(_)
                | CaptureError::InvalidTrack(_) => ErrorClass::Setup,
            },
            RuntimeError::Cancelled => ErrorClass::Cancelled,
            RuntimeError::ExecutionError { .. } | RuntimeError::Pose(_) => ErrorClass::Internal,
        }
    }
}
