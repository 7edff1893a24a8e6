// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod analyze;
pub mod check;
pub mod generate;
pub mod init;
pub mod inspect;

use runtime::{RuntimeConfig, RuntimeError};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the config file if one was given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    match path {
        Some(path) => {
            let config = RuntimeConfig::from_file(path)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => Ok(RuntimeConfig::default()),
    }
}

/// Exit code for a failed command.
///
/// Runtime errors anywhere in the chain decide the code; anything else is
/// an internal failure.
pub fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<RuntimeError>())
        .map(|e| u8::try_from(e.class().exit_code()).unwrap_or(1))
        .unwrap_or(1)
}

/// Prints `error` and returns the matching exit code.
pub fn report(error: anyhow::Error) -> ExitCode {
    let code = exit_code(&error);
    if code == 130 {
        eprintln!("  Cancelled.");
    } else {
        eprintln!("error: {error:#}");
    }
    ExitCode::from(code)
}

/// Formats a byte count as MB with two decimals.
pub fn megabytes(bytes: usize) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pose_capture::CaptureError;

    #[test]
    fn test_exit_code_from_runtime_error() {
        let err = anyhow::Error::from(RuntimeError::Capture(
            CaptureError::InsufficientSeedData {
                found: 3,
                required: 32,
            },
        ));
        assert_eq!(exit_code(&err), 3);
        assert_eq!(exit_code(&anyhow::Error::from(RuntimeError::Cancelled)), 130);
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::from(RuntimeError::ConfigError("bad".into()))
            .context("loading pipeline");
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_foreign_error_is_internal() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn test_missing_config_file_is_setup() {
        let err = load_config(Some(Path::new("/nonexistent/posegen.toml"))).unwrap_err();
        assert_eq!(exit_code(&err), 2);
        assert_eq!(load_config(None).unwrap(), RuntimeConfig::default());
    }
}
