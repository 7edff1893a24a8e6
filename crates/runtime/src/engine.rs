// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The generation engine with a type-state–enforced pipeline.
//!
//! ```text
//! PoseEngine<Idle>
//!     │  .load()            model dir → LoadedPipeline
//!     ▼
//! PoseEngine<Ready>
//!     │  .generate(source, extractor, …)      or .generate_from_seed(…)
//!     ▼
//!   GenerationOutput { result, metrics }
//! ```
//!
//! Each state transition consumes the old value and returns a new one,
//! making invalid state sequences a compile error. A `Ready` engine can run
//! any number of times; every run detects the device afresh and owns its
//! own window.

use crate::{
    AutoregressiveGenerator, Device, GenerationMetrics, LoadedPipeline, PipelineLoader,
    PosePredictor, RuntimeConfig, RuntimeError,
};
use pose_capture::{CaptureError, FrameSampler, LandmarkExtractor, SeedBuilder, SeedReport, VideoSource};
use pose_core::{GenerationResult, JointTopology, PoseVector};
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

// ── Type-state markers ─────────────────────────────────────────

/// Engine is created but no model is loaded.
#[derive(Debug)]
pub struct Idle;

/// Pipeline is loaded; the engine can generate.
#[derive(Debug)]
pub struct Ready {
    pipeline: LoadedPipeline,
    load_duration: Duration,
}

/// Sealed trait for engine states.
pub trait EngineState: std::fmt::Debug {}
impl EngineState for Idle {}
impl EngineState for Ready {}

// ── Output ─────────────────────────────────────────────────────

/// The result of a single generation run.
#[derive(Debug)]
pub struct GenerationOutput {
    pub result: GenerationResult,
    /// How the seed was obtained; `None` for runs started from a given seed.
    pub seed_report: Option<SeedReport>,
    pub metrics: GenerationMetrics,
}

// ── Engine ─────────────────────────────────────────────────────

/// The primary generation engine.
///
/// # Example
/// ```no_run
/// use pose_capture::{LandmarkTrack, TrackExtractor};
/// use runtime::{PoseEngine, RuntimeConfig};
/// use std::path::Path;
/// use std::sync::atomic::AtomicBool;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = PoseEngine::new(RuntimeConfig::default()).load()?;
/// let track = LandmarkTrack::load(Path::new("seed_landmarks.json"))?;
/// let output = engine.generate(
///     track.into_source("seed_landmarks.json"),
///     TrackExtractor::default(),
///     None,
///     &AtomicBool::new(false),
/// )?;
/// println!("{}", output.metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct PoseEngine<S: EngineState = Idle> {
    config: RuntimeConfig,
    topology: JointTopology,
    state: S,
}

// ── Idle → Ready ───────────────────────────────────────────────

impl PoseEngine<Idle> {
    /// Creates a new engine from the given configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        tracing::info!(model_dir = %config.model_dir.display(), "engine created");
        Self {
            config,
            topology: JointTopology::MEDIAPIPE_POSE,
            state: Idle,
        }
    }

    /// Uses a landmark topology other than MediaPipe Pose.
    pub fn with_topology(mut self, topology: JointTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Validates the config and loads the pipeline from `model_dir`.
    pub fn load(self) -> Result<PoseEngine<Ready>, RuntimeError> {
        self.config.validate()?;
        let started = Instant::now();
        let pipeline = PipelineLoader::load(&self.config.model_dir)?;
        let load_duration = started.elapsed();
        tracing::info!(
            seq_len = pipeline.config().seq_len,
            load_ms = load_duration.as_secs_f64() * 1000.0,
            "model loaded"
        );
        self.with_pipeline(pipeline, load_duration)
    }

    /// Moves to `Ready` with an already-loaded pipeline.
    ///
    /// # Errors
    /// [`RuntimeError::ConfigError`] if the model's joint count differs from
    /// the engine's landmark topology.
    pub fn with_pipeline(
        self,
        pipeline: LoadedPipeline,
        load_duration: Duration,
    ) -> Result<PoseEngine<Ready>, RuntimeError> {
        if pipeline.config().num_joints != self.topology.num_joints {
            return Err(RuntimeError::ConfigError(format!(
                "model expects {} joints, landmark topology '{}' has {}",
                pipeline.config().num_joints,
                self.topology.name,
                self.topology.num_joints
            )));
        }
        Ok(PoseEngine {
            config: self.config,
            topology: self.topology,
            state: Ready {
                pipeline,
                load_duration,
            },
        })
    }
}

// ── Ready: generate ────────────────────────────────────────────

impl PoseEngine<Ready> {
    pub fn pipeline(&self) -> &LoadedPipeline {
        &self.state.pipeline
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Window length of the loaded model.
    pub fn seq_len(&self) -> usize {
        self.state.pipeline.model.seq_len()
    }

    pub fn topology(&self) -> JointTopology {
        self.topology
    }

    /// Samples `source`, builds the seed and generates `num_frames` poses.
    ///
    /// # Errors
    /// - [`RuntimeError::Capture`] with `InsufficientSeedData` if the video
    ///   has fewer valid frames than the window length.
    /// - [`RuntimeError::Cancelled`] if `cancel` is raised.
    pub fn generate<S, E>(
        &self,
        source: S,
        extractor: E,
        video_path: Option<String>,
        cancel: &AtomicBool,
    ) -> Result<GenerationOutput, RuntimeError>
    where
        S: VideoSource,
        E: LandmarkExtractor<S::Frame>,
    {
        let started = Instant::now();
        let sampler = FrameSampler::new(source, self.config.proc_fps)?;
        let seed = SeedBuilder::new(self.seq_len(), self.topology)
            .build_cancellable(sampler, extractor, cancel)
            .map_err(|e| match e {
                CaptureError::Cancelled => RuntimeError::Cancelled,
                other => RuntimeError::Capture(other),
            })?;
        let seed_duration = started.elapsed();

        let mut output = self.run(&seed.poses, video_path, cancel, started)?;
        output.metrics.seed_duration = seed_duration;
        output.seed_report = Some(seed.report);
        Ok(output)
    }

    /// Generates from an already-normalised seed of exactly `seq_len` poses.
    pub fn generate_from_seed(
        &self,
        seed: &[PoseVector],
        video_path: Option<String>,
        cancel: &AtomicBool,
    ) -> Result<GenerationOutput, RuntimeError> {
        self.run(seed, video_path, cancel, Instant::now())
    }

    fn run(
        &self,
        seed: &[PoseVector],
        video_path: Option<String>,
        cancel: &AtomicBool,
        started: Instant,
    ) -> Result<GenerationOutput, RuntimeError> {
        let device = Device::detect(self.config.device);
        let mut metrics = GenerationMetrics::new(device.label());
        metrics.load_duration = self.state.load_duration;

        let generator =
            AutoregressiveGenerator::new(&self.state.pipeline.model, seed, device.kernel())?
                .with_progress_interval(self.config.progress_interval);
        let outcome = generator.run(self.config.num_frames, cancel)?;

        let result = outcome.sequence.finish(video_path);
        result.validate()?;
        if self.config.enable_profiling {
            metrics.step_durations = outcome.step_durations;
        }
        metrics.finalise(
            started.elapsed(),
            result.seed_frames(),
            result.generated_frames(),
        );
        tracing::info!(
            seed = result.seed_frames(),
            generated = result.generated_frames(),
            total = result.total_frames(),
            "generation complete"
        );
        tracing::info!("{}", metrics.summary());

        Ok(GenerationOutput {
            result,
            seed_report: None,
            metrics,
        })
    }
}

impl<S: EngineState> std::fmt::Debug for PoseEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoseEngine")
            .field("state", &std::any::type_name::<S>())
            .field("model_dir", &self.config.model_dir)
            .field("num_frames", &self.config.num_frames)
            .field("topology", &self.topology.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::{CheckpointWriter, ModelConfig, ModelGraph, CHECKPOINT_FILE};

    fn write_model(dir: &std::path::Path, seq_len: usize) {
        let mut cfg = ModelConfig::new(seq_len);
        cfg.hidden_channels = vec![4, 8];
        let graph = ModelGraph::from_config("m", &cfg).unwrap().validate().unwrap();
        CheckpointWriter::synthetic(&graph, 5)
            .write(&dir.join(CHECKPOINT_FILE))
            .unwrap();
    }

    fn seed(len: usize) -> Vec<PoseVector> {
        (0..len)
            .map(|i| PoseVector::new(vec![0.01 * i as f32; 99]))
            .collect()
    }

    #[test]
    fn test_idle_to_ready() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), 5);
        let config = RuntimeConfig {
            model_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let engine = PoseEngine::new(config).load().unwrap();
        assert_eq!(engine.seq_len(), 5);
        assert!(format!("{engine:?}").contains("Ready"));
    }

    #[test]
    fn test_generate_from_seed() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), 5);
        let config = RuntimeConfig {
            model_dir: dir.path().to_path_buf(),
            num_frames: 7,
            ..Default::default()
        };
        let engine = PoseEngine::new(config).load().unwrap();
        let out = engine
            .generate_from_seed(&seed(5), Some("clip.mp4".into()), &AtomicBool::new(false))
            .unwrap();
        assert_eq!(out.result.total_frames(), 12);
        assert_eq!(out.result.video_path(), Some("clip.mp4"));
        assert_eq!(out.metrics.step_durations.len(), 7);
        assert!(out.seed_report.is_none());
    }

    #[test]
    fn test_profiling_disabled_keeps_no_steps() {
        let dir = tempfile::tempdir().unwrap();
        write_model(dir.path(), 3);
        let config = RuntimeConfig {
            model_dir: dir.path().to_path_buf(),
            num_frames: 2,
            enable_profiling: false,
            ..Default::default()
        };
        let engine = PoseEngine::new(config).load().unwrap();
        let out = engine
            .generate_from_seed(&seed(3), None, &AtomicBool::new(false))
            .unwrap();
        assert!(out.metrics.step_durations.is_empty());
        assert_eq!(out.metrics.frames_generated, 2);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let config = RuntimeConfig {
            proc_fps: 0.0,
            ..Default::default()
        };
        let err = PoseEngine::new(config).load().unwrap_err();
        assert!(matches!(err, RuntimeError::ConfigError(_)));
    }
}
