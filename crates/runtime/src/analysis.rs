// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optional auxiliary transforms trained alongside the regressor.
//!
//! - [`PcaTransform`] projects pose vectors onto principal components:
//!   `z = C · (x − mean)`.
//! - [`KMeansModel`] assigns a vector to its nearest centroid.
//!
//! Centroids may live either in PCA space or in raw pose space; the
//! dimension decides which, see [`assign_clusters`].

use crate::RuntimeError;
use pose_core::GenerationResult;
use std::path::Path;

/// Principal-component projection.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PcaTransform {
    pub mean: Vec<f32>,
    /// `K` rows of length `D`.
    pub components: Vec<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explained_variance: Option<Vec<f32>>,
}

impl PcaTransform {
    /// Loads and validates a transform from JSON.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let pca: Self = read_json(path)?;
        pca.validate().map_err(|detail| RuntimeError::AuxiliaryModel {
            path: path.to_path_buf(),
            detail,
        })?;
        Ok(pca)
    }

    fn validate(&self) -> Result<(), String> {
        if self.mean.is_empty() || self.components.is_empty() {
            return Err("empty mean or components".into());
        }
        if let Some((i, row)) = self
            .components
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != self.mean.len())
        {
            return Err(format!(
                "component {i} has length {}, mean has {}",
                row.len(),
                self.mean.len()
            ));
        }
        if let Some(var) = &self.explained_variance {
            if var.len() != self.components.len() {
                return Err(format!(
                    "{} explained variances for {} components",
                    var.len(),
                    self.components.len()
                ));
            }
        }
        Ok(())
    }

    /// Input dimension `D`.
    pub fn input_dim(&self) -> usize {
        self.mean.len()
    }

    /// Output dimension `K`.
    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn transform(&self, x: &[f32]) -> Result<Vec<f32>, RuntimeError> {
        if x.len() != self.mean.len() {
            return Err(dim_error("PCA", self.mean.len(), x.len()));
        }
        Ok(self
            .components
            .iter()
            .map(|row| {
                row.iter()
                    .zip(x.iter().zip(&self.mean))
                    .map(|(c, (xi, m))| c * (xi - m))
                    .sum()
            })
            .collect())
    }
}

/// Nearest-centroid cluster model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct KMeansModel {
    pub centroids: Vec<Vec<f32>>,
}

impl KMeansModel {
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let model: Self = read_json(path)?;
        let dim = model.centroids.first().map(Vec::len).unwrap_or(0);
        if dim == 0 || model.centroids.iter().any(|c| c.len() != dim) {
            return Err(RuntimeError::AuxiliaryModel {
                path: path.to_path_buf(),
                detail: "centroids must be non-empty and of equal length".into(),
            });
        }
        Ok(model)
    }

    pub fn num_clusters(&self) -> usize {
        self.centroids.len()
    }

    pub fn dim(&self) -> usize {
        self.centroids.first().map(Vec::len).unwrap_or(0)
    }

    /// Index of the nearest centroid (squared Euclidean distance).
    pub fn predict(&self, x: &[f32]) -> Result<usize, RuntimeError> {
        if x.len() != self.dim() {
            return Err(dim_error("k-means", self.dim(), x.len()));
        }
        let mut best = (0, f32::INFINITY);
        for (i, c) in self.centroids.iter().enumerate() {
            let d: f32 = c.iter().zip(x).map(|(a, b)| (a - b) * (a - b)).sum();
            if d < best.1 {
                best = (i, d);
            }
        }
        Ok(best.0)
    }
}

/// Cluster assignment of every pose in a result.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ClusterAssignment {
    /// Cluster index per pose, in sequence order.
    pub labels: Vec<usize>,
    /// Number of poses per cluster.
    pub histogram: Vec<usize>,
    /// Whether poses were projected with PCA before assignment.
    pub projected: bool,
}

/// Assigns every pose in `result` to a cluster.
///
/// Poses are projected first when the centroids have the PCA output
/// dimension; centroids with the raw pose dimension are used directly.
pub fn assign_clusters(
    result: &GenerationResult,
    pca: Option<&PcaTransform>,
    kmeans: &KMeansModel,
) -> Result<ClusterAssignment, RuntimeError> {
    let dim = kmeans.dim();
    let projector = match pca {
        _ if dim == result.pose_dimension() => None,
        Some(p) if dim == p.n_components() => Some(p),
        _ => return Err(dim_error("k-means centroids", result.pose_dimension(), dim)),
    };

    let mut labels = Vec::with_capacity(result.total_frames());
    for pose in result.poses() {
        let label = match projector {
            Some(p) => kmeans.predict(&p.transform(pose.as_slice())?)?,
            None => kmeans.predict(pose.as_slice())?,
        };
        labels.push(label);
    }
    let mut histogram = vec![0; kmeans.num_clusters()];
    for &l in &labels {
        histogram[l] += 1;
    }
    Ok(ClusterAssignment {
        labels,
        histogram,
        projected: projector.is_some(),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, RuntimeError> {
    let aux = |detail: String| RuntimeError::AuxiliaryModel {
        path: path.to_path_buf(),
        detail,
    };
    let text = std::fs::read_to_string(path).map_err(|e| aux(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| aux(e.to_string()))
}

fn dim_error(what: &str, expected: usize, actual: usize) -> RuntimeError {
    RuntimeError::ConfigError(format!(
        "{what} dimension mismatch: expected {expected}, got {actual}"
    ))
}
