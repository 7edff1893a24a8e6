// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `posegen check` command: verify a deployment before running it.
//!
//! Reports the model directory's files, the compute device a run would use
//! and the capture backends compiled into this build.

use runtime::{Device, DevicePreference, FileStatus, PipelineLoader, RuntimeError};
use std::path::PathBuf;

pub async fn execute(model_dir: PathBuf, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(model_dir).await;
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              posegen · Setup Check                  ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let report = {
        let dir = model_dir.clone();
        tokio::task::spawn_blocking(move || PipelineLoader::check(&dir))
            .await
            .map_err(|e| anyhow::anyhow!("setup check failed: {e}"))?
    };

    // ── Model Directory ────────────────────────────────────────
    println!("  Model directory: {}", report.model_dir.display());
    print_status("checkpoint", true, &report.checkpoint);
    print_status(runtime::PCA_FILE, false, &report.pca);
    print_status(runtime::KMEANS_FILE, false, &report.kmeans);
    println!();

    // ── Device ─────────────────────────────────────────────────
    let device = Device::detect(DevicePreference::Auto);
    println!("  Device:");
    println!("   Compute:  {}", device.label());
    println!("   Kernel:   {}", device.kernel());
    println!("   Cores:    {}", device.cores());
    println!();

    // ── Capture Backends ───────────────────────────────────────
    println!("  Capture backends: {}", pose_capture::enabled_backends().join(", "));
    println!();

    if report.is_ready() {
        println!("  Ready.");
        println!();
        Ok(())
    } else {
        Err(RuntimeError::ConfigError(format!(
            "model directory '{}' is not usable",
            model_dir.display()
        ))
        .into())
    }
}

/// Machine-readable variant for deployment scripts.
async fn print_json(model_dir: PathBuf) -> anyhow::Result<()> {
    let report = tokio::task::spawn_blocking(move || PipelineLoader::check(&model_dir))
        .await
        .map_err(|e| anyhow::anyhow!("setup check failed: {e}"))?;
    let ready = report.is_ready();
    let device = Device::detect(DevicePreference::Auto);
    let doc = serde_json::json!({
        "ready": ready,
        "report": report,
        "device": device.label(),
        "backends": pose_capture::enabled_backends(),
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    if ready {
        Ok(())
    } else {
        Err(RuntimeError::ConfigError("model directory is not usable".into()).into())
    }
}

fn print_status(name: &str, required: bool, status: &FileStatus) {
    let (mark, detail) = match status {
        FileStatus::Ok(detail) => ("ok", detail.as_str()),
        FileStatus::Absent if required => ("MISSING", "required"),
        FileStatus::Absent => ("absent", "optional, skipped"),
        FileStatus::Invalid(detail) => ("INVALID", detail.as_str()),
    };
    println!("   {name:<24} [{mark}] {detail}");
}
