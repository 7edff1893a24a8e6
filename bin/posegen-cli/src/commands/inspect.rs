// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `posegen inspect` command: display the checkpoint's model structure.
//!
//! Reads only the SafeTensors header and the embedded config, so it is
//! cheap even for large checkpoints.

use super::megabytes;
use runtime::RuntimeError;
use std::path::PathBuf;

pub async fn execute(model_dir: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             posegen · Model Inspector               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let graph = model_ir::ModelLoader::load(&model_dir).map_err(RuntimeError::from)?;
    let cfg = &graph.config;

    // ── Summary ────────────────────────────────────────────────
    println!("  Model: {}", graph.name);
    println!("  Window: {} frames × {} joints × {} coords", cfg.seq_len, cfg.num_joints, cfg.in_channels);
    println!("  Hidden widths: {:?}", cfg.hidden_channels);
    println!("  Output dimension: {}", cfg.pose_dim());
    println!("  Layers: {}", graph.num_layers());
    println!("  Parameters: {}", graph.num_parameters());
    println!("  Total weights: {}", megabytes(graph.total_weight_bytes()));
    println!("  Largest layer: {}", megabytes(graph.max_layer_bytes()));
    println!();

    // ── Per-Layer Detail ───────────────────────────────────────
    println!(
        "  {:<4} {:<18} {:<18} {:<18} {:>10} {:>10}",
        "Idx", "Name", "Type", "Output", "Weights", "Activ.",
    );
    println!("  {}", "-".repeat(84));
    for layer in graph.iter_layers() {
        println!(
            "  {:<4} {:<18} {:<18} {:<18} {:>7.1} KB {:>7.1} KB",
            layer.index,
            layer.name,
            layer.layer_type.as_str(),
            layer.output_shape.to_string(),
            layer.estimated_weight_bytes() as f64 / 1024.0,
            layer.estimated_activation_bytes() as f64 / 1024.0,
        );
    }
    println!();

    // ── Parameters ─────────────────────────────────────────────
    println!("  Parameters:");
    for (name, shape) in graph.expected_weights() {
        println!("   {name:<32} {shape}");
    }
    println!();
    Ok(())
}
