// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Weight loading from SafeTensors checkpoints with memory-mapped I/O.
//!
//! [`WeightLoader`] maps the checkpoint once, verifies its header against
//! the graph its embedded config implies, and then copies each parameter
//! into an owned [`Tensor`]. The mapping is released when the loader drops,
//! so nothing keeps the checkpoint file open once the model is built.

use crate::RuntimeError;
use model_ir::{graph::Validated, CheckpointWriter, ModelGraph, ModelLoader};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tensor_core::{DType, Shape, Tensor};

/// A memory-mapped checkpoint.
pub struct WeightLoader {
    path: PathBuf,
    mmap: memmap2::Mmap,
}

impl WeightLoader {
    /// Maps the checkpoint at `path`.
    pub fn open(path: &Path) -> Result<Self, RuntimeError> {
        let file = std::fs::File::open(path).map_err(|source| {
            model_ir::ModelError::CheckpointRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        // SAFETY: read-only mapping; the file is not modified while mapped.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|source| {
            model_ir::ModelError::CheckpointRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(
            "weight loader: mmap'd {} ({:.2} MB)",
            path.display(),
            mmap.len() as f64 / (1024.0 * 1024.0),
        );
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the mapped file in bytes.
    pub fn size_bytes(&self) -> usize {
        self.mmap.len()
    }

    /// Decodes the embedded config and verifies the header against the
    /// graph it implies.
    pub fn graph(&self) -> Result<ModelGraph<Validated>, RuntimeError> {
        let config = ModelLoader::read_config(&self.mmap)?;
        let meta = ModelLoader::read_weight_metadata(&self.mmap)?;
        let name = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stgcn_regressor".into());
        Ok(ModelLoader::from_config_and_meta(name, &config, &meta)?)
    }

    /// Copies every parameter of `graph` out of the mapping.
    pub fn load_weights(&self, graph: &ModelGraph<Validated>) -> Result<WeightStore, RuntimeError> {
        let st = safetensors::SafeTensors::deserialize(&self.mmap).map_err(|e| {
            RuntimeError::WeightLoadError {
                name: self.path.display().to_string(),
                detail: format!("SafeTensors parse error: {e}"),
            }
        })?;

        let mut tensors = HashMap::new();
        for (name, shape) in graph.expected_weights() {
            let view = st.tensor(name).map_err(|e| RuntimeError::WeightLoadError {
                name: name.to_string(),
                detail: format!("tensor not found: {e}"),
            })?;
            if view.dtype() != safetensors::Dtype::F32 {
                return Err(RuntimeError::WeightLoadError {
                    name: name.to_string(),
                    detail: format!("expected F32 data, found {:?}", view.dtype()),
                });
            }
            let tensor = Tensor::from_le_bytes(shape.clone(), DType::F32, view.data())
                .map_err(|e| RuntimeError::WeightLoadError {
                    name: name.to_string(),
                    detail: e.to_string(),
                })?;
            tensors.insert(name.to_string(), tensor);
        }
        tracing::debug!(tensors = tensors.len(), "weights materialised");
        Ok(WeightStore { tensors })
    }
}

impl std::fmt::Debug for WeightLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightLoader")
            .field("path", &self.path)
            .field("size_bytes", &self.mmap.len())
            .finish()
    }
}

// ── Weight store ───────────────────────────────────────────────────

/// Named parameter tensors waiting to be moved into model stages.
#[derive(Debug, Clone, Default)]
pub struct WeightStore {
    tensors: HashMap<String, Tensor>,
}

impl WeightStore {
    /// Copies the tensors queued in a checkpoint writer.
    pub fn from_checkpoint(writer: &CheckpointWriter) -> Self {
        writer
            .iter()
            .map(|(name, t)| (name.to_string(), t.clone()))
            .collect()
    }

    /// Removes and returns a parameter, checking its shape.
    pub fn take(&mut self, name: &str, expected: &Shape) -> Result<Tensor, RuntimeError> {
        let tensor = self
            .tensors
            .remove(name)
            .ok_or_else(|| RuntimeError::WeightLoadError {
                name: name.to_string(),
                detail: "not present in weight store".into(),
            })?;
        if tensor.shape() != expected {
            return Err(RuntimeError::WeightLoadError {
                name: name.to_string(),
                detail: format!("expected shape {expected}, found {}", tensor.shape()),
            });
        }
        Ok(tensor)
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) {
        self.tensors.insert(name.into(), tensor);
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Names still held, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tensors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, Tensor)> for WeightStore {
    fn from_iter<I: IntoIterator<Item = (String, Tensor)>>(iter: I) -> Self {
        Self {
            tensors: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::{ModelConfig, CHECKPOINT_FILE};

    fn small_graph() -> ModelGraph<Validated> {
        let mut cfg = ModelConfig::new(4);
        cfg.hidden_channels = vec![8, 16];
        ModelGraph::from_config("tiny", &cfg).unwrap().validate().unwrap()
    }

    #[test]
    fn test_roundtrip_through_file() {
        let graph = small_graph();
        let writer = CheckpointWriter::synthetic(&graph, 3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CHECKPOINT_FILE);
        writer.write(&path).unwrap();

        let loader = WeightLoader::open(&path).unwrap();
        assert!(loader.size_bytes() > 0);
        let loaded_graph = loader.graph().unwrap();
        assert_eq!(loaded_graph.config, graph.config);
        assert_eq!(loaded_graph.name, "stgcn_regressor");

        let store = loader.load_weights(&loaded_graph).unwrap();
        assert_eq!(store.len(), writer.len());
        for (name, tensor) in writer.iter() {
            assert_eq!(store.get(name), Some(tensor), "{name}");
        }
    }

    #[test]
    fn test_missing_file_is_model_error() {
        let err = WeightLoader::open(Path::new("/nonexistent/ckpt.safetensors")).unwrap_err();
        assert!(matches!(err, RuntimeError::ModelError(_)));
    }

    #[test]
    fn test_take_checks_shape() {
        let mut store: WeightStore = [("w".to_string(), Tensor::zeros(Shape::vector(4)))]
            .into_iter()
            .collect();
        assert!(store.take("w", &Shape::vector(5)).is_err());

        let mut store = WeightStore::default();
        store.insert("w", Tensor::zeros(Shape::vector(4)));
        assert!(store.take("w", &Shape::vector(4)).is_ok());
        assert!(store.is_empty());
        assert!(matches!(
            store.take("w", &Shape::vector(4)),
            Err(RuntimeError::WeightLoadError { .. })
        ));
    }

    #[test]
    fn test_from_checkpoint() {
        let graph = small_graph();
        let writer = CheckpointWriter::synthetic(&graph, 0);
        let store = WeightStore::from_checkpoint(&writer);
        assert_eq!(store.len(), graph.expected_weights().count());
        assert!(store.names().contains(&"fc.weight"));
    }
}
