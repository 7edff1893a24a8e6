// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Loading everything a generation run needs from a model directory.
//!
//! ```text
//! model_dir/
//! ├── stgcn_regressor.safetensors   required
//! ├── pca_transformer.json          optional
//! └── kmeans_clusters.json          optional
//! ```
//!
//! An absent optional file is logged and skipped. A present file that fails
//! to parse is an error, as is anything wrong with the checkpoint.

use crate::analysis::{KMeansModel, PcaTransform};
use crate::{RuntimeError, StgcnRegressor, WeightLoader};
use model_ir::{graph::Validated, ModelConfig, ModelGraph, CHECKPOINT_FILE};
use std::path::{Path, PathBuf};

/// PCA transform filename inside a model directory.
pub const PCA_FILE: &str = "pca_transformer.json";

/// K-means model filename inside a model directory.
pub const KMEANS_FILE: &str = "kmeans_clusters.json";

/// The loaded model and its optional companions.
#[derive(Debug)]
pub struct LoadedPipeline {
    pub model: StgcnRegressor,
    pub graph: ModelGraph<Validated>,
    pub pca: Option<PcaTransform>,
    pub kmeans: Option<KMeansModel>,
    pub model_dir: PathBuf,
}

impl LoadedPipeline {
    pub fn config(&self) -> &ModelConfig {
        &self.graph.config
    }
}

/// Status of one file in a model directory.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum FileStatus {
    /// Present and usable; the string describes what was found.
    Ok(String),
    Absent,
    /// Present but unusable.
    Invalid(String),
}

impl FileStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, FileStatus::Ok(_))
    }
}

/// Result of checking a model directory without running anything.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SetupReport {
    pub model_dir: PathBuf,
    pub checkpoint: FileStatus,
    pub pca: FileStatus,
    pub kmeans: FileStatus,
}

impl SetupReport {
    /// `true` when nothing required is missing and no present file is broken.
    pub fn is_ready(&self) -> bool {
        self.checkpoint.is_ok()
            && !matches!(self.pca, FileStatus::Invalid(_))
            && !matches!(self.kmeans, FileStatus::Invalid(_))
    }
}

/// Loads pipelines from model directories.
pub struct PipelineLoader;

impl PipelineLoader {
    /// Loads the checkpoint and any auxiliary models found in `model_dir`.
    pub fn load(model_dir: &Path) -> Result<LoadedPipeline, RuntimeError> {
        let checkpoint = model_dir.join(CHECKPOINT_FILE);
        let loader = WeightLoader::open(&checkpoint)?;
        let graph = loader.graph()?;
        let weights = loader.load_weights(&graph)?;
        drop(loader);
        let model = StgcnRegressor::from_weights(&graph, weights)?;
        tracing::info!("{}", graph.summary());

        let pca = load_optional(&model_dir.join(PCA_FILE), PcaTransform::from_file)?;
        let kmeans = load_optional(&model_dir.join(KMEANS_FILE), KMeansModel::from_file)?;

        Ok(LoadedPipeline {
            model,
            graph,
            pca,
            kmeans,
            model_dir: model_dir.to_path_buf(),
        })
    }

    /// Inspects `model_dir` and reports on every file, never failing.
    pub fn check(model_dir: &Path) -> SetupReport {
        let checkpoint_path = model_dir.join(CHECKPOINT_FILE);
        let checkpoint = if !checkpoint_path.exists() {
            FileStatus::Absent
        } else {
            match WeightLoader::open(&checkpoint_path).and_then(|l| {
                let graph = l.graph()?;
                l.load_weights(&graph)?;
                Ok(graph)
            }) {
                Ok(graph) => FileStatus::Ok(graph.summary()),
                Err(e) => FileStatus::Invalid(e.to_string()),
            }
        };

        let pca = check_optional(&model_dir.join(PCA_FILE), |p| {
            PcaTransform::from_file(p).map(|pca| {
                format!("{} components over {} dims", pca.n_components(), pca.input_dim())
            })
        });
        let kmeans = check_optional(&model_dir.join(KMEANS_FILE), |p| {
            KMeansModel::from_file(p)
                .map(|km| format!("{} clusters of dim {}", km.num_clusters(), km.dim()))
        });

        SetupReport {
            model_dir: model_dir.to_path_buf(),
            checkpoint,
            pca,
            kmeans,
        }
    }
}

fn load_optional<T>(
    path: &Path,
    load: impl FnOnce(&Path) -> Result<T, RuntimeError>,
) -> Result<Option<T>, RuntimeError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "optional model file not found, skipping");
        return Ok(None);
    }
    let value = load(path)?;
    tracing::info!(path = %path.display(), "loaded auxiliary model");
    Ok(Some(value))
}

fn check_optional(
    path: &Path,
    describe: impl FnOnce(&Path) -> Result<String, RuntimeError>,
) -> FileStatus {
    if !path.exists() {
        return FileStatus::Absent;
    }
    match describe(path) {
        Ok(s) => FileStatus::Ok(s),
        Err(e) => FileStatus::Invalid(e.to_string()),
    }
}
