// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The computation stages of the ST-GCN regressor.
//!
//! Each stage owns its parameters and maps one activation tensor to the
//! next. Batch-norm statistics are folded into a per-channel scale and
//! shift when the stage is built.
//!
//! ```text
//! (N,3,T,V) ─ InputProjection ─▶ (N,h0,T,V)
//!           ─ TemporalConvStage ─ SpatialMixStage ─▶ … per hidden width
//!           ─ GlobalAvgPool ─▶ (N,h_last) ─ LinearHead ─▶ (N, V·3)
//! ```

use crate::{RuntimeError, WeightStore};
use model_ir::{LayerDef, BATCH_NORM_EPS};
use tensor_core::{
    batch_norm, global_avg_pool, linear, pointwise_conv, relu_inplace, temporal_conv,
    BatchNormParams, Kernel, Shape, Tensor, TensorError,
};

/// One step of the forward pass.
pub trait Stage: Send + Sync {
    /// Parameter prefix of this stage (e.g. `"blocks.1.tconv"`).
    fn name(&self) -> &str;

    fn forward(&self, input: &Tensor, kernel: Kernel) -> Result<Tensor, RuntimeError>;

    /// Scalar parameters held, including folded batch-norm terms.
    fn num_parameters(&self) -> usize {
        0
    }
}

fn exec_err(stage: &str) -> impl FnOnce(TensorError) -> RuntimeError + '_ {
    move |source| RuntimeError::ExecutionError {
        stage: stage.to_string(),
        source,
    }
}

fn nctv(op: &'static str, t: &Tensor) -> Result<(usize, usize, usize, usize), TensorError> {
    t.shape().as_nctv().ok_or_else(|| TensorError::RankMismatch {
        op,
        expected: 4,
        actual: t.shape().clone(),
    })
}

/// Takes the `i`-th parameter of `layer` out of the store.
fn param(layer: &LayerDef, i: usize, weights: &mut WeightStore) -> Result<Tensor, RuntimeError> {
    match (layer.weight_names.get(i), layer.weight_shapes.get(i)) {
        (Some(name), Some(shape)) => weights.take(name, shape),
        _ => Err(RuntimeError::WeightLoadError {
            name: layer.name.clone(),
            detail: format!("layer declares no parameter #{i}"),
        }),
    }
}

/// Reads the four batch-norm tensors starting at parameter `first`.
fn folded_bn(
    layer: &LayerDef,
    first: usize,
    weights: &mut WeightStore,
) -> Result<BatchNormParams, RuntimeError> {
    let gamma = param(layer, first, weights)?;
    let beta = param(layer, first + 1, weights)?;
    let mean = param(layer, first + 2, weights)?;
    let var = param(layer, first + 3, weights)?;
    BatchNormParams::fold(
        gamma.as_slice(),
        beta.as_slice(),
        mean.as_slice(),
        var.as_slice(),
        BATCH_NORM_EPS,
    )
    .map_err(exec_err(&layer.name))
}

/// Applies folded batch-norm then ReLU, returning a fresh tensor.
fn bn_relu(x: &Tensor, bn: &BatchNormParams) -> Result<Tensor, TensorError> {
    let mut out = Tensor::zeros(x.shape().clone());
    batch_norm(&x.view(), bn, &mut out)?;
    relu_inplace(&mut out);
    Ok(out)
}

fn out_channels(weight: &Tensor) -> usize {
    weight.shape().dim(0).unwrap_or(0)
}

// ── Input projection ───────────────────────────────────────────────

/// Pointwise lift from coordinate channels to the first hidden width.
pub struct InputProjection {
    name: String,
    weight: Tensor,
    bias: Tensor,
}

impl InputProjection {
    pub fn from_weights(layer: &LayerDef, weights: &mut WeightStore) -> Result<Self, RuntimeError> {
        Ok(Self {
            name: layer.name.clone(),
            weight: param(layer, 0, weights)?,
            bias: param(layer, 1, weights)?,
        })
    }
}

impl Stage for InputProjection {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Tensor, kernel: Kernel) -> Result<Tensor, RuntimeError> {
        let run = || -> Result<Tensor, TensorError> {
            let (n, _, t, v) = nctv("input_projection", input)?;
            let mut out = Tensor::zeros(Shape::nctv(n, out_channels(&self.weight), t, v));
            pointwise_conv(
                &input.view(),
                &self.weight.view(),
                &self.bias.view(),
                &mut out,
                kernel,
            )?;
            Ok(out)
        };
        run().map_err(exec_err(&self.name))
    }

    fn num_parameters(&self) -> usize {
        self.weight.shape().num_elements() + self.bias.shape().num_elements()
    }
}

// ── Temporal convolution ───────────────────────────────────────────

/// `(kt × 1)` convolution over time, then batch-norm and ReLU.
pub struct TemporalConvStage {
    name: String,
    weight: Tensor,
    bias: Tensor,
    bn: BatchNormParams,
}

impl TemporalConvStage {
    /// Parameters: conv weight, conv bias, then the four batch-norm tensors.
    pub fn from_weights(layer: &LayerDef, weights: &mut WeightStore) -> Result<Self, RuntimeError> {
        Ok(Self {
            name: layer.name.clone(),
            weight: param(layer, 0, weights)?,
            bias: param(layer, 1, weights)?,
            bn: folded_bn(layer, 2, weights)?,
        })
    }
}

impl Stage for TemporalConvStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Tensor, kernel: Kernel) -> Result<Tensor, RuntimeError> {
        let run = || -> Result<Tensor, TensorError> {
            let (n, _, t, v) = nctv("temporal_conv", input)?;
            let mut conv = Tensor::zeros(Shape::nctv(n, out_channels(&self.weight), t, v));
            temporal_conv(
                &input.view(),
                &self.weight.view(),
                &self.bias.view(),
                &mut conv,
                kernel,
            )?;
            bn_relu(&conv, &self.bn)
        };
        run().map_err(exec_err(&self.name))
    }

    fn num_parameters(&self) -> usize {
        self.weight.shape().num_elements()
            + self.bias.shape().num_elements()
            + 4 * self.bn.channels()
    }
}

// ── Spatial mix ────────────────────────────────────────────────────

/// Pointwise channel mix at every joint, then batch-norm and ReLU.
pub struct SpatialMixStage {
    name: String,
    weight: Tensor,
    bias: Tensor,
    bn: BatchNormParams,
}

impl SpatialMixStage {
    pub fn from_weights(layer: &LayerDef, weights: &mut WeightStore) -> Result<Self, RuntimeError> {
        Ok(Self {
            name: layer.name.clone(),
            weight: param(layer, 0, weights)?,
            bias: param(layer, 1, weights)?,
            bn: folded_bn(layer, 2, weights)?,
        })
    }
}

impl Stage for SpatialMixStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Tensor, kernel: Kernel) -> Result<Tensor, RuntimeError> {
        let run = || -> Result<Tensor, TensorError> {
            let (n, _, t, v) = nctv("spatial_mix", input)?;
            let mut mixed = Tensor::zeros(Shape::nctv(n, out_channels(&self.weight), t, v));
            pointwise_conv(
                &input.view(),
                &self.weight.view(),
                &self.bias.view(),
                &mut mixed,
                kernel,
            )?;
            bn_relu(&mixed, &self.bn)
        };
        run().map_err(exec_err(&self.name))
    }

    fn num_parameters(&self) -> usize {
        self.weight.shape().num_elements()
            + self.bias.shape().num_elements()
            + 4 * self.bn.channels()
    }
}

// ── Pool ───────────────────────────────────────────────────────────

/// Mean over the time and joint axes.
pub struct GlobalAvgPool {
    name: String,
}

impl GlobalAvgPool {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Stage for GlobalAvgPool {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Tensor, _kernel: Kernel) -> Result<Tensor, RuntimeError> {
        let run = || -> Result<Tensor, TensorError> {
            let (n, c, _, _) = nctv("global_avg_pool", input)?;
            let mut out = Tensor::zeros(Shape::matrix(n, c));
            global_avg_pool(&input.view(), &mut out)?;
            Ok(out)
        };
        run().map_err(exec_err(&self.name))
    }
}

// ── Head ───────────────────────────────────────────────────────────

/// Fully-connected regression head.
pub struct LinearHead {
    name: String,
    weight: Tensor,
    bias: Tensor,
}

impl LinearHead {
    pub fn from_weights(layer: &LayerDef, weights: &mut WeightStore) -> Result<Self, RuntimeError> {
        Ok(Self {
            name: layer.name.clone(),
            weight: param(layer, 0, weights)?,
            bias: param(layer, 1, weights)?,
        })
    }
}

impl Stage for LinearHead {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Tensor, kernel: Kernel) -> Result<Tensor, RuntimeError> {
        let rows = input.shape().dim(0).unwrap_or(0);
        let mut out = Tensor::zeros(Shape::matrix(rows, out_channels(&self.weight)));
        linear(
            &input.view(),
            &self.weight.view(),
            &self.bias.view(),
            &mut out,
            kernel,
        )
        .map_err(exec_err(&self.name))?;
        Ok(out)
    }

    fn num_parameters(&self) -> usize {
        self.weight.shape().num_elements() + self.bias.shape().num_elements()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::LayerType;
    use tensor_core::DType;

    fn layer(name: &str, params: Vec<(&str, Shape)>) -> LayerDef {
        let (weight_names, weight_shapes) = params
            .into_iter()
            .map(|(n, s)| (format!("{name}.{n}"), s))
            .unzip();
        LayerDef {
            name: name.into(),
            layer_type: LayerType::TemporalConv,
            index: 0,
            weight_names,
            weight_shapes,
            dtype: DType::F32,
            input_shape: Shape::nctv(1, 1, 3, 1),
            output_shape: Shape::nctv(1, 1, 3, 1),
        }
    }

    fn store(entries: Vec<(String, Tensor)>) -> WeightStore {
        entries.into_iter().collect()
    }

    #[test]
    fn test_temporal_stage_applies_bn_and_relu() {
        let def = layer(
            "t",
            vec![
                ("w", Shape::conv(1, 1, 3, 1)),
                ("b", Shape::vector(1)),
                ("g", Shape::vector(1)),
                ("beta", Shape::vector(1)),
                ("m", Shape::vector(1)),
                ("v", Shape::vector(1)),
            ],
        );
        let t = |s: Shape, v: &[f32]| Tensor::from_f32(s, v).unwrap();
        let mut weights = store(vec![
            ("t.w".into(), t(Shape::conv(1, 1, 3, 1), &[0.0, 1.0, 0.0])),
            ("t.b".into(), t(Shape::vector(1), &[0.0])),
            ("t.g".into(), t(Shape::vector(1), &[2.0])),
            ("t.beta".into(), t(Shape::vector(1), &[0.0])),
            ("t.m".into(), t(Shape::vector(1), &[1.0])),
            ("t.v".into(), t(Shape::vector(1), &[1.0 - BATCH_NORM_EPS])),
        ]);
        let stage = TemporalConvStage::from_weights(&def, &mut weights).unwrap();
        assert!(weights.is_empty());
        assert_eq!(stage.num_parameters(), 3 + 1 + 4);

        // Identity conv, then y = 2 * (x - 1), then ReLU.
        let x = t(Shape::nctv(1, 1, 3, 1), &[0.0, 1.5, 3.0]);
        let y = stage.forward(&x, Kernel::Scalar).unwrap();
        let got = y.as_slice();
        assert_eq!(got[0], 0.0);
        assert!((got[1] - 1.0).abs() < 1e-5);
        assert!((got[2] - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_missing_parameter() {
        let def = layer("p", vec![("w", Shape::conv(2, 3, 1, 1)), ("b", Shape::vector(2))]);
        let mut weights = store(vec![(
            "p.w".into(),
            Tensor::zeros(Shape::conv(2, 3, 1, 1)),
        )]);
        let err = InputProjection::from_weights(&def, &mut weights).err().unwrap();
        assert!(matches!(err, RuntimeError::WeightLoadError { ref name, .. } if name == "p.b"));
    }

    #[test]
    fn test_pool_and_head() {
        let pool = GlobalAvgPool::new("pool");
        let x = Tensor::from_f32(Shape::nctv(1, 2, 1, 2), &[1.0, 3.0, -2.0, 2.0]).unwrap();
        let pooled = pool.forward(&x, Kernel::Scalar).unwrap();
        assert_eq!(pooled.as_slice(), &[2.0, 0.0]);

        let def = layer("fc", vec![("weight", Shape::matrix(1, 2)), ("bias", Shape::vector(1))]);
        let mut weights = store(vec![
            (
                "fc.weight".into(),
                Tensor::from_f32(Shape::matrix(1, 2), &[0.5, 1.0]).unwrap(),
            ),
            (
                "fc.bias".into(),
                Tensor::from_f32(Shape::vector(1), &[0.25]).unwrap(),
            ),
        ]);
        let head = LinearHead::from_weights(&def, &mut weights).unwrap();
        let out = head.forward(&pooled, Kernel::Wide).unwrap();
        assert_eq!(out.shape(), &Shape::matrix(1, 1));
        assert!((out.as_slice()[0] - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_rank_error_names_stage() {
        let pool = GlobalAvgPool::new("pool");
        let err = pool
            .forward(&Tensor::zeros(Shape::matrix(2, 2)), Kernel::Scalar)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ExecutionError { ref stage, .. } if stage == "pool"));
    }
}
