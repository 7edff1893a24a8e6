// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! A lightweight intermediate representation (IR) for the spatio-temporal
//! graph-convolution (ST-GCN) pose regressor.
//!
//! The IR captures what the runtime needs to rebuild the trained network
//! without any training framework:
//!
//! - [`ModelConfig`] — the hyper-parameters embedded in the checkpoint.
//! - [`LayerType`] — the kind of computation each layer performs.
//! - [`LayerDef`] — a single layer's parameter names, shapes and activations.
//! - [`ModelGraph`] — the network as an ordered chain of layers,
//!   with a **type-state pattern** (`Loaded` → `Validated`).
//! - [`ModelLoader`] — reads a checkpoint header and verifies it against the
//!   graph built from its own configuration.
//! - [`CheckpointWriter`] — writes checkpoints (used for synthetic models).
//!
//! # Checkpoint Format
//! A model directory holds `stgcn_regressor.safetensors`. Besides the weight
//! tensors, its SafeTensors metadata carries a `cfg` key whose value is the
//! JSON-encoded [`ModelConfig`].
//!
//! # Example
//! ```no_run
//! use model_ir::ModelLoader;
//! use std::path::Path;
//!
//! let graph = ModelLoader::load(Path::new("./model_outputs")).unwrap();
//! println!("{}", graph.summary());
//! for layer in graph.iter_layers() {
//!     println!("  {}", layer.summary());
//! }
//! ```

mod checkpoint;
mod config;
mod error;
pub mod graph;
mod layer;

pub use checkpoint::{
    CheckpointWriter, ModelLoader, WeightMeta, CFG_METADATA_KEY, CHECKPOINT_FILE,
};
pub use config::ModelConfig;
pub use error::ModelError;
pub use graph::ModelGraph;
pub use layer::{LayerDef, LayerType, BATCH_NORM_EPS, TEMPORAL_KERNEL};
