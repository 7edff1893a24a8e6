// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: the ST-GCN regressor as an ordered chain of layers.
//!
//! # Type-State Pattern
//!
//! The graph transitions through states enforced at compile time:
//!
//! ```text
//! ModelGraph<Loaded>     — layers derived from a config, not yet checked.
//!       │  .validate()
//!       ▼
//! ModelGraph<Validated>  — shapes chained, parameter names unique.
//! ```
//!
//! The runtime only builds stages from a validated graph. The transition
//! consumes the old state and returns the new one; the marker types are
//! `PhantomData` (ZST).
//!
//! # Layer Chain
//!
//! ```text
//! (1, C, L, V) ─ input_proj ─▶ (1, h0, L, V)
//!   └─ for each width h:  blocks.i.tconv ─▶ (1, h, L, V)
//!                         blocks.i.sconv ─▶ (1, h, L, V)
//!   └─ pool ─▶ (1, h_last) ─ fc ─▶ (1, V·C)
//! ```

use crate::layer::BN_PARAMS;
use crate::{LayerDef, LayerType, ModelConfig, ModelError, TEMPORAL_KERNEL};
use std::collections::HashSet;
use std::fmt;
use tensor_core::{DType, Shape};

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been built but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and can be executed.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── ModelGraph ─────────────────────────────────────────────────────

/// The complete model represented as an ordered sequence of layers.
///
/// The generic parameter `S` encodes the validation state at compile time.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Loaded> {
    /// Human-readable model name (usually the checkpoint stem).
    pub name: String,
    /// Hyper-parameters the layers were derived from.
    pub config: ModelConfig,
    /// Ordered list of layer definitions.
    pub layers: Vec<LayerDef>,
    /// State marker (zero-sized, compile-time only).
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Creates a new graph in the `Loaded` state from explicit layers.
    pub fn new(name: String, config: ModelConfig, layers: Vec<LayerDef>) -> Self {
        Self {
            name,
            config,
            layers,
            _state: std::marker::PhantomData,
        }
    }

    /// Derives the layer chain implied by `config` for a batch of one.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfig`] if the config fails validation.
    pub fn from_config(name: impl Into<String>, config: &ModelConfig) -> Result<Self, ModelError> {
        config.validate()?;

        let (c, l, v) = (config.in_channels, config.seq_len, config.num_joints);
        let h0 = config.hidden_channels[0];
        let mut layers = Vec::with_capacity(2 * config.hidden_channels.len() + 3);

        let mut push = |name: String,
                        layer_type: LayerType,
                        weights: Vec<(String, Shape)>,
                        input_shape: Shape,
                        output_shape: Shape| {
            let index = layers.len();
            let (weight_names, weight_shapes) = weights.into_iter().unzip();
            layers.push(LayerDef {
                name,
                layer_type,
                index,
                weight_names,
                weight_shapes,
                dtype: DType::F32,
                input_shape,
                output_shape,
            });
        };

        push(
            "input_proj".into(),
            LayerType::InputProjection,
            vec![
                ("input_proj.weight".into(), Shape::conv(h0, c, 1, 1)),
                ("input_proj.bias".into(), Shape::vector(h0)),
            ],
            Shape::nctv(1, c, l, v),
            Shape::nctv(1, h0, l, v),
        );

        let mut ch_in = h0;
        for (i, &h) in config.hidden_channels.iter().enumerate() {
            let mut tconv = vec![
                (
                    format!("blocks.{i}.tconv.conv.weight"),
                    Shape::conv(h, ch_in, TEMPORAL_KERNEL, 1),
                ),
                (format!("blocks.{i}.tconv.conv.bias"), Shape::vector(h)),
            ];
            tconv.extend(
                BN_PARAMS
                    .iter()
                    .map(|p| (format!("blocks.{i}.tconv.bn.{p}"), Shape::vector(h))),
            );
            push(
                format!("blocks.{i}.tconv"),
                LayerType::TemporalConv,
                tconv,
                Shape::nctv(1, ch_in, l, v),
                Shape::nctv(1, h, l, v),
            );

            let mut sconv = vec![
                (format!("blocks.{i}.sconv.weight"), Shape::conv(h, h, 1, 1)),
                (format!("blocks.{i}.sconv.bias"), Shape::vector(h)),
            ];
            sconv.extend(
                BN_PARAMS
                    .iter()
                    .map(|p| (format!("blocks.{i}.bn.{p}"), Shape::vector(h))),
            );
            push(
                format!("blocks.{i}.sconv"),
                LayerType::SpatialConv,
                sconv,
                Shape::nctv(1, h, l, v),
                Shape::nctv(1, h, l, v),
            );
            ch_in = h;
        }

        push(
            "pool".into(),
            LayerType::GlobalAvgPool,
            vec![],
            Shape::nctv(1, ch_in, l, v),
            Shape::matrix(1, ch_in),
        );

        let out = config.pose_dim();
        push(
            "fc".into(),
            LayerType::Linear,
            vec![
                ("fc.weight".into(), Shape::matrix(out, ch_in)),
                ("fc.bias".into(), Shape::vector(out)),
            ],
            Shape::matrix(1, ch_in),
            Shape::matrix(1, out),
        );

        Ok(Self::new(name.into(), config.clone(), layers))
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - The graph is non-empty.
    /// - Layer indices are consecutive starting from 0.
    /// - No layer has zero-element shapes.
    /// - Each layer's output shape equals the next layer's input shape.
    /// - Parameter names are unique across the graph.
    pub fn validate(self) -> Result<ModelGraph<Validated>, ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::InvalidGraph(
                "model graph contains no layers".into(),
            ));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.index != i {
                return Err(ModelError::InvalidLayer {
                    layer: layer.name.clone(),
                    detail: format!("expected index {i}, got {}", layer.index),
                });
            }
            if layer.input_shape.num_elements() == 0 || layer.output_shape.num_elements() == 0 {
                return Err(ModelError::InvalidLayer {
                    layer: layer.name.clone(),
                    detail: "activation shape has zero elements".into(),
                });
            }
            if layer.weight_names.len() != layer.weight_shapes.len() {
                return Err(ModelError::InvalidLayer {
                    layer: layer.name.clone(),
                    detail: "weight names and shapes differ in length".into(),
                });
            }
        }

        for pair in self.layers.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            if current.output_shape != next.input_shape {
                return Err(ModelError::InvalidLayer {
                    layer: next.name.clone(),
                    detail: format!(
                        "input {} does not match '{}' output {}",
                        next.input_shape, current.name, current.output_shape
                    ),
                });
            }
        }

        let mut seen = HashSet::new();
        for layer in &self.layers {
            for name in &layer.weight_names {
                if !seen.insert(name.as_str()) {
                    return Err(ModelError::InvalidLayer {
                        layer: layer.name.clone(),
                        detail: format!("duplicate parameter '{name}'"),
                    });
                }
            }
        }

        Ok(ModelGraph {
            name: self.name,
            config: self.config,
            layers: self.layers,
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    /// Returns the total number of layers.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Returns the total number of scalar parameters.
    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(LayerDef::num_parameters).sum()
    }

    /// Returns the total estimated memory for all weights in bytes.
    pub fn total_weight_bytes(&self) -> usize {
        self.layers.iter().map(|l| l.estimated_weight_bytes()).sum()
    }

    /// Returns the estimated memory for the largest single layer.
    pub fn max_layer_bytes(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.estimated_total_bytes())
            .max()
            .unwrap_or(0)
    }

    /// Returns an iterator over the layers in execution order.
    pub fn iter_layers(&self) -> impl Iterator<Item = &LayerDef> {
        self.layers.iter()
    }

    /// Returns a reference to a layer by index.
    pub fn layer(&self, index: usize) -> Option<&LayerDef> {
        self.layers.get(index)
    }

    /// Returns every `(parameter name, expected shape)` pair in layer order.
    pub fn expected_weights(&self) -> impl Iterator<Item = (&str, &Shape)> {
        self.layers.iter().flat_map(|l| {
            l.weight_names
                .iter()
                .map(String::as_str)
                .zip(l.weight_shapes.iter())
        })
    }

    /// Shape of the input window tensor, `(1, C, L, V)`.
    pub fn input_shape(&self) -> &Shape {
        &self.layers[0].input_shape
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        let total_weight_mb = self.total_weight_bytes() as f64 / (1024.0 * 1024.0);
        let max_layer_mb = self.max_layer_bytes() as f64 / (1024.0 * 1024.0);
        format!(
            "Model '{}': {} layers, seq_len {}, hidden {:?}, {} params ({:.2} MB), largest layer {:.2} MB",
            self.name,
            self.num_layers(),
            self.config.seq_len,
            self.config.hidden_channels,
            self.num_parameters(),
            total_weight_mb,
            max_layer_mb,
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ModelGraph '{}' ({} layers):", self.name, self.layers.len())?;
        for layer in &self.layers {
            writeln!(f, "  {}", layer.summary())?;
        }
        Ok(())
    }
}
