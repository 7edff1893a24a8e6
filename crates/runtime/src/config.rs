// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model_dir = "./model_outputs"
//! num_frames = 100
//! proc_fps = 4.0
//! output_file = "generated_poses.json"
//! device = "auto"
//! progress_interval = 25
//! enable_profiling = true
//! ```

use crate::{DevicePreference, RuntimeError};
use std::path::{Path, PathBuf};

/// Configuration for a generation run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    /// Directory holding the checkpoint and optional auxiliary models.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    /// Number of poses to generate after the seed.
    #[serde(default = "default_num_frames")]
    pub num_frames: usize,
    /// Rate at which the seed video is sampled, in frames per second.
    #[serde(default = "default_proc_fps")]
    pub proc_fps: f64,
    /// Where the result document is written.
    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
    /// Compute preference; `cpu` forces the scalar kernel.
    #[serde(default)]
    pub device: DevicePreference,
    /// Steps between progress log lines (`0` disables them).
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
    /// Whether to record per-step timings.
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("./model_outputs")
}

fn default_num_frames() -> usize {
    100
}

fn default_proc_fps() -> f64 {
    4.0
}

fn default_output_file() -> PathBuf {
    PathBuf::from("generated_poses.json")
}

fn default_progress_interval() -> usize {
    25
}

fn default_true() -> bool {
    true
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if !(self.proc_fps.is_finite() && self.proc_fps > 0.0) {
            return Err(RuntimeError::ConfigError(format!(
                "proc_fps must be a positive number, got {}",
                self.proc_fps
            )));
        }
        if self.output_file.as_os_str().is_empty() {
            return Err(RuntimeError::ConfigError("output_file is empty".into()));
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            num_frames: default_num_frames(),
            proc_fps: default_proc_fps(),
            output_file: default_output_file(),
            device: DevicePreference::default(),
            progress_interval: default_progress_interval(),
            enable_profiling: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = RuntimeConfig::default();
        assert_eq!(c.num_frames, 100);
        assert_eq!(c.proc_fps, 4.0);
        assert_eq!(c.device, DevicePreference::Auto);
        assert!(c.enable_profiling);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
model_dir = "/tmp/model"
num_frames = 10
proc_fps = 2.5
device = "cpu"
enable_profiling = false
"#;
        let c = RuntimeConfig::from_toml(toml).unwrap();
        assert_eq!(c.model_dir, PathBuf::from("/tmp/model"));
        assert_eq!(c.num_frames, 10);
        assert_eq!(c.proc_fps, 2.5);
        assert_eq!(c.device, DevicePreference::Cpu);
        assert!(!c.enable_profiling);
        assert_eq!(c.output_file, PathBuf::from("generated_poses.json"));
        assert_eq!(c.progress_interval, 25);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(RuntimeConfig::from_toml("").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = RuntimeConfig {
            num_frames: 0,
            device: DevicePreference::Cpu,
            ..Default::default()
        };
        let back = RuntimeConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_rejects_bad_fps() {
        assert!(RuntimeConfig::from_toml("proc_fps = 0.0").is_err());
        assert!(RuntimeConfig::from_toml("proc_fps = -4.0").is_err());
    }

    #[test]
    fn test_rejects_unknown_device() {
        let err = RuntimeConfig::from_toml("device = \"cuda\"").unwrap_err();
        assert!(matches!(err, RuntimeError::ConfigError(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let err = RuntimeConfig::from_file(Path::new("/nonexistent/posegen.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }
}
