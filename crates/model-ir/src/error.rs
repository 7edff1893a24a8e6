// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for checkpoint loading and IR construction.

use tensor_core::{DType, Shape};

/// Errors that can occur when working with model representations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The checkpoint file could not be opened or read.
    #[error("failed to read checkpoint '{path}': {source}")]
    CheckpointRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The SafeTensors container is malformed.
    #[error("failed to load SafeTensors: {0}")]
    SafeTensorsError(String),

    /// The checkpoint carries no embedded configuration record.
    #[error("checkpoint has no '{key}' metadata entry")]
    MissingConfig { key: &'static str },

    /// The embedded configuration is not valid JSON for [`crate::ModelConfig`].
    #[error("failed to parse model config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The configuration parsed but describes an impossible network.
    #[error("invalid model config: {0}")]
    InvalidConfig(String),

    /// A parameter the graph requires is absent from the checkpoint.
    #[error("weight tensor not found: {name}")]
    WeightNotFound { name: String },

    /// The checkpoint contains a parameter the graph does not know about.
    #[error("unexpected weight tensor: {name}")]
    UnexpectedWeight { name: String },

    /// A parameter's shape differs from what the configuration implies.
    #[error("weight '{name}' has shape {actual}, expected {expected}")]
    WeightShapeMismatch {
        name: String,
        expected: Shape,
        actual: Shape,
    },

    /// A parameter is stored in a dtype the runtime cannot compute with.
    #[error("weight '{name}' has unsupported dtype {dtype}")]
    UnsupportedDType { name: String, dtype: DType },

    /// A layer definition is invalid (e.g., incompatible shapes).
    #[error("invalid layer '{layer}': {detail}")]
    InvalidLayer { layer: String, detail: String },

    /// The model graph is empty or otherwise malformed.
    #[error("invalid model graph: {0}")]
    InvalidGraph(String),

    /// Writing a checkpoint failed.
    #[error("failed to write checkpoint: {0}")]
    CheckpointWrite(String),
}
