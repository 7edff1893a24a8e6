// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # posegen
//!
//! Command-line interface for seeded pose-sequence generation.
//!
//! ## Usage
//! ```bash
//! # Generate 100 poses continuing the motion in a video
//! posegen generate --video ./clip.mp4 --model-dir ./model_outputs
//!
//! # Same, from a recorded landmark track
//! posegen generate --landmarks ./clip.track.json --num-frames 50
//!
//! # Inspect the checkpoint and verify the model directory
//! posegen inspect --model-dir ./model_outputs
//! posegen check --model-dir ./model_outputs
//! ```
//!
//! Exit codes: `0` success, `1` internal error, `2` setup error,
//! `3` not enough usable seed frames, `130` cancelled.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "posegen",
    about = "Seeded 3D pose-sequence generation with an ST-GCN predictor",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file; explicit flags override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a seed from a video and generate a continuation.
    Generate(commands::generate::GenerateArgs),

    /// Print the checkpoint's config, layer graph and memory estimates.
    Inspect {
        /// Directory holding the checkpoint.
        #[arg(short, long)]
        model_dir: Option<PathBuf>,
    },

    /// Verify a model directory and report the compute device.
    Check {
        /// Directory holding the checkpoint and auxiliary models.
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Assign the poses of a result file to k-means clusters.
    Analyze {
        /// Result JSON written by `generate`.
        #[arg(short, long)]
        result: PathBuf,

        /// Directory holding the auxiliary models.
        #[arg(short, long)]
        model_dir: Option<PathBuf>,
    },

    /// Write a synthetic checkpoint for smoke-testing a deployment.
    Init {
        /// Directory to write the checkpoint into.
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Window length of the synthetic model.
        #[arg(long, default_value_t = 32)]
        seq_len: usize,

        /// Comma-separated hidden widths (e.g., "64,128,256").
        #[arg(long, default_value = "64,128,256")]
        hidden: String,

        /// RNG seed for the synthetic weights.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Overwrite an existing checkpoint.
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return commands::report(e),
    };

    let result = match cli.command {
        Commands::Generate(args) => commands::generate::execute(config, args).await,
        Commands::Inspect { model_dir } => {
            commands::inspect::execute(model_dir.unwrap_or(config.model_dir)).await
        }
        Commands::Check { model_dir, json } => {
            commands::check::execute(model_dir.unwrap_or(config.model_dir), json).await
        }
        Commands::Analyze { result, model_dir } => {
            commands::analyze::execute(result, model_dir.unwrap_or(config.model_dir)).await
        }
        Commands::Init {
            model_dir,
            seq_len,
            hidden,
            seed,
            force,
        } => {
            commands::init::execute(
                model_dir.unwrap_or(config.model_dir),
                seq_len,
                hidden,
                seed,
                force,
            )
            .await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => commands::report(e),
    }
}
