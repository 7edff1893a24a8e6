// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Checkpoint header verification and checkpoint writing.
//!
//! The loader reads `stgcn_regressor.safetensors` from a model directory:
//! - the `cfg` metadata entry is parsed into a [`ModelConfig`];
//! - a fresh [`ModelGraph`] is derived from that config;
//! - every tensor in the header is checked against the graph's parameters.
//!
//! Weight *data* is **not** loaded into memory here. Only the SafeTensors
//! header is inspected; the runtime materialises tensors afterwards via
//! memory-mapped I/O.

use crate::graph::Validated;
use crate::{ModelConfig, ModelError, ModelGraph};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tensor_core::{DType, Shape, Tensor};

/// Checkpoint filename inside a model directory.
pub const CHECKPOINT_FILE: &str = "stgcn_regressor.safetensors";

/// SafeTensors metadata key holding the JSON-encoded [`ModelConfig`].
pub const CFG_METADATA_KEY: &str = "cfg";

/// Batch-norm step counters are training state and carry no inference weight.
const IGNORED_SUFFIX: &str = ".num_batches_tracked";

/// Metadata for a single tensor extracted from the SafeTensors header.
#[derive(Debug, Clone)]
pub struct WeightMeta {
    /// Tensor name (key in the SafeTensors file).
    pub name: String,
    /// Shape of the tensor.
    pub shape: Shape,
    /// Data type.
    pub dtype: DType,
    /// Size in bytes.
    pub size_bytes: usize,
}

impl WeightMeta {
    /// Builds metadata for an `f32` tensor of the given shape.
    pub fn f32(name: impl Into<String>, shape: Shape) -> Self {
        let size_bytes = shape.size_bytes(DType::F32);
        Self {
            name: name.into(),
            shape,
            dtype: DType::F32,
            size_bytes,
        }
    }
}

/// Loads a checkpoint header into a validated [`ModelGraph`].
///
/// # Example
/// ```no_run
/// use model_ir::ModelLoader;
/// use std::path::Path;
///
/// let graph = ModelLoader::load(Path::new("./model_outputs")).unwrap();
/// println!("Loaded {} layers", graph.num_layers());
/// ```
pub struct ModelLoader;

impl ModelLoader {
    /// Loads and verifies the checkpoint in `model_dir`.
    pub fn load(model_dir: &Path) -> Result<ModelGraph<Validated>, ModelError> {
        Self::load_file(&model_dir.join(CHECKPOINT_FILE))
    }

    /// Loads and verifies a checkpoint file.
    ///
    /// Steps:
    /// 1. Memory-map the file and parse the SafeTensors header.
    /// 2. Decode the embedded `cfg` record.
    /// 3. Derive and validate the graph that config implies.
    /// 4. Verify every tensor against the graph's parameters.
    pub fn load_file(path: &Path) -> Result<ModelGraph<Validated>, ModelError> {
        let file = std::fs::File::open(path).map_err(|source| ModelError::CheckpointRead {
            path: path.to_path_buf(),
            source,
        })?;

        // SAFETY: the mapping is read-only and dropped before this function
        // returns; concurrent truncation of the file is not supported.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|source| {
            ModelError::CheckpointRead {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let config = Self::read_config(&mmap)?;
        let weight_meta = Self::read_weight_metadata(&mmap)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stgcn_regressor".into());

        let graph = Self::from_config_and_meta(name, &config, &weight_meta)?;
        tracing::debug!(
            path = %path.display(),
            tensors = weight_meta.len(),
            "checkpoint header verified"
        );
        Ok(graph)
    }

    /// Builds a graph from a config and verifies pre-read weight metadata.
    ///
    /// Useful for testing without actual SafeTensors files.
    pub fn from_config_and_meta(
        name: impl Into<String>,
        config: &ModelConfig,
        weight_meta: &HashMap<String, WeightMeta>,
    ) -> Result<ModelGraph<Validated>, ModelError> {
        let graph = ModelGraph::from_config(name, config)?.validate()?;
        Self::verify(&graph, weight_meta)?;
        Ok(graph)
    }

    /// Checks that `weight_meta` holds exactly the graph's parameters.
    ///
    /// Missing, mis-shaped or non-`f32` parameters are rejected, as is any
    /// extra tensor except batch-norm step counters.
    pub fn verify(
        graph: &ModelGraph<Validated>,
        weight_meta: &HashMap<String, WeightMeta>,
    ) -> Result<(), ModelError> {
        for (name, expected) in graph.expected_weights() {
            let meta = weight_meta.get(name).ok_or_else(|| ModelError::WeightNotFound {
                name: name.to_string(),
            })?;
            if meta.dtype != DType::F32 {
                return Err(ModelError::UnsupportedDType {
                    name: name.to_string(),
                    dtype: meta.dtype,
                });
            }
            if &meta.shape != expected {
                return Err(ModelError::WeightShapeMismatch {
                    name: name.to_string(),
                    expected: expected.clone(),
                    actual: meta.shape.clone(),
                });
            }
        }

        let known: std::collections::HashSet<&str> =
            graph.expected_weights().map(|(n, _)| n).collect();
        let mut extra: Vec<&String> = weight_meta
            .keys()
            .filter(|n| !known.contains(n.as_str()) && !n.ends_with(IGNORED_SUFFIX))
            .collect();
        extra.sort();
        if let Some(name) = extra.first() {
            return Err(ModelError::UnexpectedWeight {
                name: (*name).clone(),
            });
        }
        Ok(())
    }

    /// Decodes the `cfg` metadata entry of a SafeTensors buffer.
    pub fn read_config(buffer: &[u8]) -> Result<ModelConfig, ModelError> {
        let (_, metadata) = safetensors::SafeTensors::read_metadata(buffer)
            .map_err(|e| ModelError::SafeTensorsError(format!("SafeTensors parse error: {e}")))?;
        let cfg = metadata
            .metadata()
            .as_ref()
            .and_then(|m| m.get(CFG_METADATA_KEY))
            .ok_or(ModelError::MissingConfig {
                key: CFG_METADATA_KEY,
            })?;
        let config = ModelConfig::from_json(cfg)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads tensor shapes and dtypes from a SafeTensors buffer.
    pub fn read_weight_metadata(buffer: &[u8]) -> Result<HashMap<String, WeightMeta>, ModelError> {
        let tensors = safetensors::SafeTensors::deserialize(buffer)
            .map_err(|e| ModelError::SafeTensorsError(format!("SafeTensors parse error: {e}")))?;

        let mut meta = HashMap::new();
        for (name, view) in tensors.tensors() {
            let shape = Shape::new(view.shape().to_vec());
            let dtype = convert_safetensor_dtype(&name, view.dtype())?;
            let size_bytes = view.data().len();
            meta.insert(
                name.clone(),
                WeightMeta {
                    name,
                    shape,
                    dtype,
                    size_bytes,
                },
            );
        }
        Ok(meta)
    }
}

/// Converts a SafeTensors `Dtype` to our [`DType`].
pub(crate) fn convert_safetensor_dtype(
    name: &str,
    st_dtype: safetensors::Dtype,
) -> Result<DType, ModelError> {
    match st_dtype {
        safetensors::Dtype::F32 => Ok(DType::F32),
        safetensors::Dtype::F64 => Ok(DType::F64),
        safetensors::Dtype::F16 => Ok(DType::F16),
        safetensors::Dtype::BF16 => Ok(DType::BF16),
        safetensors::Dtype::I64 => Ok(DType::I64),
        other => Err(ModelError::SafeTensorsError(format!(
            "tensor '{name}' has unsupported SafeTensors dtype {other:?}"
        ))),
    }
}

// ── Writer ─────────────────────────────────────────────────────────

/// Accumulates named `f32` tensors and writes them as a checkpoint.
#[derive(Debug, Clone)]
pub struct CheckpointWriter {
    config: ModelConfig,
    tensors: BTreeMap<String, Tensor>,
}

impl CheckpointWriter {
    /// Creates an empty writer for the given config.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            tensors: BTreeMap::new(),
        }
    }

    /// Fills every parameter of `graph` with deterministic values.
    ///
    /// Convolution and linear weights are uniform in `±1/sqrt(fan_in)`;
    /// biases and batch-norm statistics take their freshly initialised
    /// values (`gamma = 1`, `beta = 0`, `mean = 0`, `var = 1`).
    pub fn synthetic(graph: &ModelGraph<Validated>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut writer = Self::new(graph.config.clone());
        for (name, shape) in graph.expected_weights() {
            let n = shape.num_elements();
            let data: Vec<f32> = if name.ends_with("running_var") || is_bn_gamma(name) {
                vec![1.0; n]
            } else if shape.rank() == 1 {
                vec![0.0; n]
            } else {
                let fan_in: usize = shape.dims()[1..].iter().product();
                let bound = 1.0 / (fan_in.max(1) as f32).sqrt();
                (0..n).map(|_| rng.random_range(-bound..bound)).collect()
            };
            // Length equals the shape by construction.
            if let Ok(t) = Tensor::from_vec(shape.clone(), data) {
                writer.tensors.insert(name.to_string(), t);
            }
        }
        writer
    }

    /// Adds or replaces a tensor.
    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) -> &mut Self {
        self.tensors.insert(name.into(), tensor);
        self
    }

    /// Removes a tensor, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Tensor> {
        self.tensors.remove(name)
    }

    /// Iterates the queued tensors in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.tensors.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Returns the config that will be embedded.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Number of tensors queued for writing.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Returns `true` if no tensors are queued.
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Serialises the checkpoint to a byte buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        let encoded = self.encode();
        let views = Self::views(&encoded)?;
        safetensors::serialize(views, &self.metadata()?)
            .map_err(|e| ModelError::CheckpointWrite(e.to_string()))
    }

    /// Writes the checkpoint to `path`.
    pub fn write(&self, path: &Path) -> Result<(), ModelError> {
        let encoded = self.encode();
        let views = Self::views(&encoded)?;
        safetensors::serialize_to_file(views, &self.metadata()?, path)
            .map_err(|e| ModelError::CheckpointWrite(format!("{}: {e}", path.display())))?;
        tracing::info!(
            path = %path.display(),
            tensors = self.tensors.len(),
            "checkpoint written"
        );
        Ok(())
    }

    fn encode(&self) -> Vec<(String, Vec<usize>, Vec<u8>)> {
        self.tensors
            .iter()
            .map(|(name, t)| (name.clone(), t.shape().dims().to_vec(), t.to_le_bytes()))
            .collect()
    }

    fn views(
        encoded: &[(String, Vec<usize>, Vec<u8>)],
    ) -> Result<Vec<(String, safetensors::tensor::TensorView<'_>)>, ModelError> {
        encoded
            .iter()
            .map(|(name, shape, data)| {
                safetensors::tensor::TensorView::new(safetensors::Dtype::F32, shape.clone(), data)
                    .map(|view| (name.clone(), view))
                    .map_err(|e| ModelError::CheckpointWrite(format!("{name}: {e}")))
            })
            .collect()
    }

    fn metadata(&self) -> Result<Option<HashMap<String, String>>, ModelError> {
        Ok(Some(HashMap::from([(
            CFG_METADATA_KEY.to_string(),
            self.config.to_json()?,
        )])))
    }
}

fn is_bn_gamma(name: &str) -> bool {
    name.contains(".bn.") && name.ends_with(".weight")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ModelConfig {
        ModelConfig {
            seq_len: 4,
            num_joints: 5,
            in_channels: 3,
            hidden_channels: vec![8, 16],
        }
    }

    fn full_meta(config: &ModelConfig) -> HashMap<String, WeightMeta> {
        let graph = ModelGraph::from_config("tiny", config)
            .unwrap()
            .validate()
            .unwrap();
        graph
            .expected_weights()
            .map(|(n, s)| (n.to_string(), WeightMeta::f32(n, s.clone())))
            .collect()
    }

    #[test]
    fn test_verify_accepts_complete_checkpoint() {
        let cfg = small_config();
        let graph = ModelLoader::from_config_and_meta("tiny", &cfg, &full_meta(&cfg)).unwrap();
        assert_eq!(graph.num_layers(), 7);
    }

    #[test]
    fn test_num_batches_tracked_is_ignored() {
        let cfg = small_config();
        let mut meta = full_meta(&cfg);
        let name = "blocks.0.bn.num_batches_tracked".to_string();
        meta.insert(
            name.clone(),
            WeightMeta {
                name,
                shape: Shape::new(vec![]),
                dtype: DType::I64,
                size_bytes: 8,
            },
        );
        assert!(ModelLoader::from_config_and_meta("tiny", &cfg, &meta).is_ok());
    }

    #[test]
    fn test_missing_weight_tensor() {
        let cfg = small_config();
        let mut meta = full_meta(&cfg);
        meta.remove("blocks.1.sconv.bias");
        let result = ModelLoader::from_config_and_meta("tiny", &cfg, &meta);
        assert!(matches!(result, Err(ModelError::WeightNotFound { ref name }) if name == "blocks.1.sconv.bias"));
    }

    #[test]
    fn test_unexpected_weight_tensor() {
        let cfg = small_config();
        let mut meta = full_meta(&cfg);
        meta.insert("blocks.2.sconv.weight".into(), WeightMeta::f32("x", Shape::vector(1)));
        let result = ModelLoader::from_config_and_meta("tiny", &cfg, &meta);
        assert!(matches!(result, Err(ModelError::UnexpectedWeight { .. })));
    }

    #[test]
    fn test_shape_mismatch_is_fatal() {
        let cfg = small_config();
        let mut meta = full_meta(&cfg);
        meta.insert(
            "fc.weight".into(),
            WeightMeta::f32("fc.weight", Shape::matrix(15, 8)),
        );
        let result = ModelLoader::from_config_and_meta("tiny", &cfg, &meta);
        assert!(matches!(result, Err(ModelError::WeightShapeMismatch { .. })));
    }

    #[test]
    fn test_half_precision_rejected() {
        let cfg = small_config();
        let mut meta = full_meta(&cfg);
        let entry = meta.get_mut("fc.bias").unwrap();
        entry.dtype = DType::F16;
        let result = ModelLoader::from_config_and_meta("tiny", &cfg, &meta);
        assert!(matches!(result, Err(ModelError::UnsupportedDType { .. })));
    }

    #[test]
    fn test_synthetic_checkpoint_roundtrip_on_disk() {
        let cfg = small_config();
        let graph = ModelGraph::from_config("tiny", &cfg).unwrap().validate().unwrap();
        let writer = CheckpointWriter::synthetic(&graph, 7);
        assert_eq!(writer.len(), 28);

        let dir = tempfile::tempdir().unwrap();
        writer.write(&dir.path().join(CHECKPOINT_FILE)).unwrap();

        let loaded = ModelLoader::load(dir.path()).unwrap();
        assert_eq!(loaded.config, cfg);
        assert_eq!(loaded.name, "stgcn_regressor");
    }

    #[test]
    fn test_synthetic_is_deterministic() {
        let cfg = small_config();
        let graph = ModelGraph::from_config("tiny", &cfg).unwrap().validate().unwrap();
        let a = CheckpointWriter::synthetic(&graph, 42).to_bytes().unwrap();
        let b = CheckpointWriter::synthetic(&graph, 42).to_bytes().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_cfg_metadata() {
        let view = safetensors::tensor::TensorView::new(
            safetensors::Dtype::F32,
            vec![1],
            &[0u8; 4],
        )
        .unwrap();
        let bytes = safetensors::serialize(vec![("fc.bias".to_string(), view)], &None).unwrap();
        assert!(matches!(
            ModelLoader::read_config(&bytes),
            Err(ModelError::MissingConfig { key: "cfg" })
        ));
    }

    #[test]
    fn test_corrupt_cfg_metadata() {
        let mut writer = CheckpointWriter::new(small_config());
        writer.insert("fc.bias", Tensor::zeros(Shape::vector(15)));
        let bytes = writer.to_bytes().unwrap();
        // The stored config parses; a truncated buffer does not.
        assert!(ModelLoader::read_config(&bytes).is_ok());
        assert!(ModelLoader::read_config(&bytes[..6]).is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ModelLoader::load(dir.path());
        assert!(matches!(result, Err(ModelError::CheckpointRead { .. })));
    }
}
