// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `posegen init` command: write a deterministic synthetic checkpoint.
//!
//! The weights are random, so generated motion is meaningless, but every
//! shape matches a real checkpoint and the whole pipeline can be exercised.

use model_ir::{CheckpointWriter, ModelConfig, ModelGraph, CHECKPOINT_FILE};
use runtime::RuntimeError;
use std::path::PathBuf;

pub async fn execute(
    model_dir: PathBuf,
    seq_len: usize,
    hidden: String,
    seed: u64,
    force: bool,
) -> anyhow::Result<()> {
    let mut config = ModelConfig::new(seq_len);
    config.hidden_channels = parse_hidden(&hidden)?;
    let graph = ModelGraph::from_config("stgcn_regressor", &config)
        .and_then(|g| g.validate())
        .map_err(RuntimeError::from)?;

    let path = model_dir.join(CHECKPOINT_FILE);
    if path.exists() && !force {
        return Err(RuntimeError::ConfigError(format!(
            "'{}' already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    std::fs::create_dir_all(&model_dir).map_err(|e| {
        RuntimeError::ConfigError(format!("cannot create '{}': {e}", model_dir.display()))
    })?;

    CheckpointWriter::synthetic(&graph, seed)
        .write(&path)
        .map_err(RuntimeError::from)?;
    tracing::info!(path = %path.display(), seed, "synthetic checkpoint written");

    println!("  Wrote {}", path.display());
    println!("  {}", graph.summary());
    Ok(())
}

fn parse_hidden(widths: &str) -> Result<Vec<usize>, RuntimeError> {
    widths.split(',')
        .map(|s| {
            s.trim().parse::<usize>().map_err(|e| {
                RuntimeError::ConfigError(format!("invalid hidden width '{}': {e}", s.trim()))
            })
        })
        .collect()
}
