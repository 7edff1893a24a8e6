// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer definitions for the ST-GCN model IR.
//!
//! Each [`LayerDef`] describes a single computation in the model graph:
//! its type, activation shapes, parameter references, and estimated memory
//! footprint. Weight data is **not** stored here, only names (keys into
//! the SafeTensors file) and the shapes the configuration implies.

use tensor_core::{DType, Shape};

/// Temporal kernel length of every block's time convolution.
pub const TEMPORAL_KERNEL: usize = 3;

/// Variance epsilon of every batch-norm layer.
pub const BATCH_NORM_EPS: f32 = 1e-5;

/// Parameter suffixes of a batch-norm layer, in checkpoint order.
pub(crate) const BN_PARAMS: [&str; 4] = ["weight", "bias", "running_mean", "running_var"];

/// The type of computation a layer performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    /// Pointwise lift of the coordinate channels to the first hidden width.
    InputProjection,
    /// `(3 × 1)` time convolution, batch-norm and ReLU.
    TemporalConv,
    /// Pointwise channel mix, batch-norm and ReLU.
    SpatialConv,
    /// Average over the time and joint axes.
    GlobalAvgPool,
    /// Fully-connected regression head.
    Linear,
}

impl LayerType {
    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputProjection => "input_projection",
            Self::TemporalConv => "temporal_conv",
            Self::SpatialConv => "spatial_conv",
            Self::GlobalAvgPool => "global_avg_pool",
            Self::Linear => "linear",
        }
    }
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing a single layer in the model graph.
///
/// A `LayerDef` does not own weight data. It stores the parameter names the
/// trained state dict uses, and the runtime loads them from the checkpoint.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LayerDef {
    /// Unique identifier for this layer (e.g., `"blocks.0.tconv"`).
    pub name: String,
    /// The type of computation this layer performs.
    pub layer_type: LayerType,
    /// Index in the execution order (0-based).
    pub index: usize,
    /// Names of parameter tensors required by this layer.
    pub weight_names: Vec<String>,
    /// Shapes of the parameter tensors (parallel to `weight_names`).
    pub weight_shapes: Vec<Shape>,
    /// Data type for this layer's weights and computation.
    pub dtype: DType,
    /// Shape of the layer's input activation.
    pub input_shape: Shape,
    /// Shape of the layer's output activation.
    pub output_shape: Shape,
}

impl LayerDef {
    /// Estimates the memory required for this layer's weights in bytes.
    pub fn estimated_weight_bytes(&self) -> usize {
        self.weight_shapes
            .iter()
            .map(|s| s.size_bytes(self.dtype))
            .sum()
    }

    /// Estimates the memory required for this layer's activations in bytes.
    ///
    /// Input and output buffers are both live while the layer executes.
    pub fn estimated_activation_bytes(&self) -> usize {
        let input_bytes = self.input_shape.size_bytes(self.dtype);
        let output_bytes = self.output_shape.size_bytes(self.dtype);
        input_bytes + output_bytes
    }

    /// Total estimated memory (weights + activations) for this layer.
    pub fn estimated_total_bytes(&self) -> usize {
        self.estimated_weight_bytes() + self.estimated_activation_bytes()
    }

    /// Number of scalar parameters held by this layer.
    pub fn num_parameters(&self) -> usize {
        self.weight_shapes.iter().map(Shape::num_elements).sum()
    }

    /// Looks up the expected shape of one of this layer's parameters.
    pub fn weight_shape(&self, name: &str) -> Option<&Shape> {
        self.weight_names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.weight_shapes[i])
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        let weight_kb = self.estimated_weight_bytes() as f64 / 1024.0;
        let act_kb = self.estimated_activation_bytes() as f64 / 1024.0;
        format!(
            "[{}] {} ({}) {} -> {}, weights: {:.1} KB, activations: {:.1} KB, {} weight tensors",
            self.index,
            self.name,
            self.layer_type,
            self.input_shape,
            self.output_shape,
            weight_kb,
            act_kb,
            self.weight_names.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layer(index: usize) -> LayerDef {
        LayerDef {
            name: format!("blocks.{index}.sconv"),
            layer_type: LayerType::SpatialConv,
            index,
            weight_names: vec!["w".into(), "b".into()],
            weight_shapes: vec![Shape::conv(64, 64, 1, 1), Shape::vector(64)],
            dtype: DType::F32,
            input_shape: Shape::nctv(1, 64, 32, 33),
            output_shape: Shape::nctv(1, 64, 32, 33),
        }
    }

    #[test]
    fn test_weight_bytes() {
        let layer = sample_layer(0);
        assert_eq!(layer.estimated_weight_bytes(), (64 * 64 + 64) * 4);
        assert_eq!(layer.num_parameters(), 64 * 64 + 64);
    }

    #[test]
    fn test_activation_bytes() {
        let layer = sample_layer(0);
        assert_eq!(layer.estimated_activation_bytes(), 2 * 64 * 32 * 33 * 4);
        assert_eq!(
            layer.estimated_total_bytes(),
            layer.estimated_weight_bytes() + layer.estimated_activation_bytes()
        );
    }

    #[test]
    fn test_weight_shape_lookup() {
        let layer = sample_layer(0);
        assert_eq!(layer.weight_shape("b"), Some(&Shape::vector(64)));
        assert_eq!(layer.weight_shape("missing"), None);
    }

    #[test]
    fn test_layer_type_display() {
        assert_eq!(format!("{}", LayerType::TemporalConv), "temporal_conv");
        assert_eq!(format!("{}", LayerType::GlobalAvgPool), "global_avg_pool");
    }

    #[test]
    fn test_summary() {
        let s = sample_layer(3).summary();
        assert!(s.contains("[3]"));
        assert!(s.contains("spatial_conv"));
        assert!(s.contains("2 weight tensors"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let layer = sample_layer(0);
        let json = serde_json::to_string(&layer).unwrap();
        let back: LayerDef = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, layer.name);
        assert_eq!(back.layer_type, layer.layer_type);
        assert_eq!(back.weight_shapes, layer.weight_shapes);
    }
}
