// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The spatio-temporal pose predictor.

use crate::stages::{
    GlobalAvgPool, InputProjection, LinearHead, SpatialMixStage, Stage, TemporalConvStage,
};
use crate::{RuntimeError, WeightStore};
use model_ir::{graph::Validated, LayerType, ModelConfig, ModelGraph};
use pose_core::PoseVector;
use tensor_core::{Kernel, Shape, Tensor};

/// Predicts the next pose from a window of past poses.
///
/// The generator only talks to this trait, so tests can swap in simple
/// predictors without building a network.
pub trait PosePredictor: Send + Sync {
    /// Window length the predictor expects.
    fn seq_len(&self) -> usize;

    /// Length of the predicted pose vector.
    fn pose_dim(&self) -> usize;

    /// Predicts one pose from a `(1, C, seq_len, V)` window tensor.
    fn predict(&self, window: &Tensor, kernel: Kernel) -> Result<PoseVector, RuntimeError>;
}

/// ST-GCN regressor evaluated as an ordered list of stages.
pub struct StgcnRegressor {
    config: ModelConfig,
    input_shape: Shape,
    stages: Vec<Box<dyn Stage>>,
}

impl StgcnRegressor {
    /// Builds the stage list for `graph`, moving parameters out of `weights`.
    ///
    /// # Errors
    /// [`RuntimeError::WeightLoadError`] if a parameter is missing or has
    /// the wrong shape.
    pub fn from_weights(
        graph: &ModelGraph<Validated>,
        mut weights: WeightStore,
    ) -> Result<Self, RuntimeError> {
        let mut stages: Vec<Box<dyn Stage>> = Vec::with_capacity(graph.num_layers());
        for layer in graph.iter_layers() {
            let stage: Box<dyn Stage> = match layer.layer_type {
                LayerType::InputProjection => {
                    Box::new(InputProjection::from_weights(layer, &mut weights)?)
                }
                LayerType::TemporalConv => {
                    Box::new(TemporalConvStage::from_weights(layer, &mut weights)?)
                }
                LayerType::SpatialConv => {
                    Box::new(SpatialMixStage::from_weights(layer, &mut weights)?)
                }
                LayerType::GlobalAvgPool => Box::new(GlobalAvgPool::new(layer.name.clone())),
                LayerType::Linear => Box::new(LinearHead::from_weights(layer, &mut weights)?),
            };
            stages.push(stage);
        }
        if !weights.is_empty() {
            tracing::warn!(unused = ?weights.names(), "weights not consumed by any stage");
        }

        let model = Self {
            config: graph.config.clone(),
            input_shape: graph.input_shape().clone(),
            stages,
        };
        tracing::debug!(
            stages = model.stages.len(),
            params = model.num_parameters(),
            "regressor built"
        );
        Ok(model)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn stages(&self) -> &[Box<dyn Stage>] {
        &self.stages
    }

    pub fn num_parameters(&self) -> usize {
        self.stages.iter().map(|s| s.num_parameters()).sum()
    }

    /// Expected input shape, `(1, C, seq_len, V)`.
    pub fn input_shape(&self) -> &Shape {
        &self.input_shape
    }

    /// Runs every stage in order. Output is `(N, V·C)`, joint-major.
    pub fn forward(&self, input: &Tensor, kernel: Kernel) -> Result<Tensor, RuntimeError> {
        let mut stages = self.stages.iter();
        let Some(first) = stages.next() else {
            return Ok(input.clone());
        };
        let mut x = first.forward(input, kernel)?;
        for stage in stages {
            x = stage.forward(&x, kernel)?;
        }
        Ok(x)
    }
}

impl PosePredictor for StgcnRegressor {
    fn seq_len(&self) -> usize {
        self.config.seq_len
    }

    fn pose_dim(&self) -> usize {
        self.config.pose_dim()
    }

    fn predict(&self, window: &Tensor, kernel: Kernel) -> Result<PoseVector, RuntimeError> {
        if window.shape() != &self.input_shape {
            return Err(RuntimeError::ExecutionError {
                stage: "input".into(),
                source: tensor_core::TensorError::ShapeMismatch {
                    op: "predict",
                    lhs: self.input_shape.clone(),
                    rhs: window.shape().clone(),
                },
            });
        }
        let out = self.forward(window, kernel)?;
        Ok(PoseVector::new(out.into_vec()))
    }
}

impl std::fmt::Debug for StgcnRegressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StgcnRegressor")
            .field("config", &self.config)
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
