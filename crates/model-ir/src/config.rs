// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model hyper-parameters embedded in the checkpoint.
//!
//! # Format
//! ```json
//! {
//!   "seq_len": 32,
//!   "num_joints": 33,
//!   "in_channels": 3,
//!   "hidden_channels": [64, 128, 256]
//! }
//! ```
//!
//! Older checkpoints spell `num_joints` as `joint_count`; both are accepted.

use crate::ModelError;

/// Configuration record that travels with the trained weights.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModelConfig {
    /// Window length `L`: number of past poses the model conditions on.
    pub seq_len: usize,
    /// Joints per pose (33 for the MediaPipe topology).
    #[serde(default = "default_num_joints", alias = "joint_count")]
    pub num_joints: usize,
    /// Coordinates per joint.
    #[serde(default = "default_in_channels")]
    pub in_channels: usize,
    /// Output width of each spatio-temporal block, in order.
    #[serde(default = "default_hidden_channels")]
    pub hidden_channels: Vec<usize>,
}

fn default_num_joints() -> usize {
    33
}

fn default_in_channels() -> usize {
    3
}

fn default_hidden_channels() -> Vec<usize> {
    vec![64, 128, 256]
}

impl ModelConfig {
    /// Creates a config with default topology and hidden widths.
    pub fn new(seq_len: usize) -> Self {
        Self {
            seq_len,
            num_joints: default_num_joints(),
            in_channels: default_in_channels(),
            hidden_channels: default_hidden_channels(),
        }
    }

    /// Parses a config from its JSON encoding.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the config as compact JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Length of a flattened pose vector (`num_joints × in_channels`).
    pub fn pose_dim(&self) -> usize {
        self.num_joints * self.in_channels
    }

    /// Checks that the config describes a buildable network.
    ///
    /// Hidden widths must be non-empty, non-zero and strictly increasing.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.seq_len == 0 {
            return Err(ModelError::InvalidConfig("seq_len must be >= 1".into()));
        }
        if self.num_joints == 0 || self.in_channels == 0 {
            return Err(ModelError::InvalidConfig(format!(
                "num_joints ({}) and in_channels ({}) must be >= 1",
                self.num_joints, self.in_channels
            )));
        }
        if self.hidden_channels.is_empty() {
            return Err(ModelError::InvalidConfig(
                "hidden_channels must list at least one block".into(),
            ));
        }
        if self.hidden_channels[0] == 0 {
            return Err(ModelError::InvalidConfig(
                "hidden_channels must be non-zero".into(),
            ));
        }
        if self.hidden_channels.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ModelError::InvalidConfig(format!(
                "hidden_channels must be strictly increasing, got {:?}",
                self.hidden_channels
            )));
        }
        Ok(())
    }
}
