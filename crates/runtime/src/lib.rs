// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! The engine that turns a seed video into a generated pose sequence.
//!
//! The runtime takes:
//! - A model directory: the ST-GCN checkpoint plus optional PCA and k-means
//!   files ([`PipelineLoader`]).
//! - A [`VideoSource`](pose_capture::VideoSource) and a
//!   [`LandmarkExtractor`](pose_capture::LandmarkExtractor) for the seed.
//!
//! And runs the regressor autoregressively over a sliding window, one pose
//! per step, collecting per-step timings.
//!
//! # Type-State Pipeline
//! ```text
//! PoseEngine<Idle> → PoseEngine<Ready>
//! ```
//! Transitions are compile-time checked.
//!
//! # Threading
//! A run is synchronous and strictly sequential. Callers that must stay
//! responsive (the CLI) run it on a blocking thread and cancel it through
//! an `AtomicBool`.

pub mod analysis;
mod config;
mod device;
mod engine;
mod error;
mod generator;
mod metrics;
mod model;
mod pipeline;
pub mod stages;
mod weight_loader;

pub use config::RuntimeConfig;
pub use device::{Device, DevicePreference};
pub use engine::{EngineState, GenerationOutput, Idle, PoseEngine, Ready};
pub use error::{ErrorClass, RuntimeError};
pub use generator::{AutoregressiveGenerator, GenerationOutcome, GeneratorState};
pub use metrics::GenerationMetrics;
pub use model::{PosePredictor, StgcnRegressor};
pub use pipeline::{FileStatus, LoadedPipeline, PipelineLoader, SetupReport, KMEANS_FILE, PCA_FILE};
pub use weight_loader::{WeightLoader, WeightStore};
