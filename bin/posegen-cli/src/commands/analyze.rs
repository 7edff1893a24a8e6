// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `posegen analyze` command: cluster the poses of a saved result.

use runtime::analysis::{assign_clusters, KMeansModel, PcaTransform};
use runtime::{RuntimeError, KMEANS_FILE, PCA_FILE};
use std::path::PathBuf;

pub async fn execute(result: PathBuf, model_dir: PathBuf) -> anyhow::Result<()> {
    let generation = pose_core::GenerationResult::load(&result).map_err(|e| {
        RuntimeError::ConfigError(format!("cannot use result '{}': {e}", result.display()))
    })?;

    let kmeans_path = model_dir.join(KMEANS_FILE);
    if !kmeans_path.exists() {
        return Err(RuntimeError::AuxiliaryModel {
            path: kmeans_path,
            detail: "not found; clustering needs a k-means model".into(),
        }
        .into());
    }
    let kmeans = KMeansModel::from_file(&kmeans_path)?;
    let pca_path = model_dir.join(PCA_FILE);
    let pca = if pca_path.exists() {
        Some(PcaTransform::from_file(&pca_path)?)
    } else {
        None
    };

    let assignment = assign_clusters(&generation, pca.as_ref(), &kmeans)?;

    println!("  Result: {}", result.display());
    println!(
        "  Frames: {} ({} seed + {} generated)",
        generation.total_frames(),
        generation.seed_frames(),
        generation.generated_frames(),
    );
    println!(
        "  Space: {}",
        if assignment.projected { "PCA" } else { "raw pose" }
    );
    println!();

    let total = assignment.labels.len().max(1);
    println!("  {:<8} {:>7} {:>7}", "Cluster", "Frames", "Share");
    println!("  {}", "-".repeat(24));
    for (cluster, &count) in assignment.histogram.iter().enumerate() {
        println!(
            "  {:<8} {:>7} {:>6.1}%",
            cluster,
            count,
            100.0 * count as f64 / total as f64,
        );
    }
    println!();

    let seed = &assignment.labels[..generation.seed_frames()];
    let generated = &assignment.labels[generation.seed_frames()..];
    println!("  Seed labels:      {}", compact(seed));
    println!("  Generated labels: {}", compact(generated));
    println!();
    Ok(())
}

/// Run-length encodes a label sequence, e.g. `0×4 2×1 1×3`.
fn compact(labels: &[usize]) -> String {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &l in labels {
        match runs.last_mut() {
            Some((label, n)) if *label == l => *n += 1,
            _ => runs.push((l, 1)),
        }
    }
    if runs.is_empty() {
        return "-".into();
    }
    runs.iter()
        .map(|(l, n)| format!("{l}×{n}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_runs() {
        assert_eq!(compact(&[0, 0, 2, 1, 1, 1]), "0×2 2×1 1×3");
        assert_eq!(compact(&[]), "-");
    }
}
