// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `posegen generate` command: seed from a video, continue the motion.
//!
//! Runs the full type-state pipeline on a blocking thread:
//! ```text
//! PoseEngine<Idle> → load → <Ready> → generate → GenerationResult → save
//! ```
//!
//! Ctrl-C raises the cancel flag; the run stops between frames or steps and
//! nothing is written.

use pose_capture::{LandmarkTrack, TrackExtractor};
use runtime::{DevicePreference, GenerationOutput, PoseEngine, RuntimeConfig, RuntimeError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Landmark model looked up in the model directory when `--pose-model` is
/// not given.
const DEFAULT_POSE_MODEL: &str = "pose_landmarker.onnx";

#[derive(clap::Args, Debug)]
#[command(group(
    clap::ArgGroup::new("input").required(true).args(["video", "landmarks"])
))]
pub struct GenerateArgs {
    /// Seed video file.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Recorded landmark track (JSON) to seed from instead of a video.
    #[arg(long)]
    landmarks: Option<PathBuf>,

    /// ONNX landmark model used with `--video`.
    #[arg(long)]
    pose_model: Option<PathBuf>,

    /// Directory holding the checkpoint and auxiliary models.
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Number of poses to generate after the seed.
    #[arg(short = 'n', long)]
    num_frames: Option<usize>,

    /// Seed sampling rate in frames per second.
    #[arg(long)]
    proc_fps: Option<f64>,

    /// Output JSON file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Compute device: auto or cpu.
    #[arg(long)]
    device: Option<DevicePreference>,
}

impl GenerateArgs {
    /// Applies the explicit flags on top of `config`.
    fn apply(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig, RuntimeError> {
        if let Some(dir) = &self.model_dir {
            config.model_dir = dir.clone();
        }
        if let Some(n) = self.num_frames {
            config.num_frames = n;
        }
        if let Some(fps) = self.proc_fps {
            config.proc_fps = fps;
        }
        if let Some(out) = &self.output {
            config.output_file = out.clone();
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        config.validate()?;
        Ok(config)
    }
}

enum SeedInput {
    Track(PathBuf),
    Video { path: PathBuf, pose_model: PathBuf },
}

pub async fn execute(config: RuntimeConfig, args: GenerateArgs) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            posegen · Sequence Generator             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let config = args.apply(config)?;
    let input = match (&args.video, &args.landmarks) {
        (_, Some(track)) => SeedInput::Track(track.clone()),
        (Some(video), None) => SeedInput::Video {
            path: video.clone(),
            pose_model: args
                .pose_model
                .clone()
                .unwrap_or_else(|| config.model_dir.join(DEFAULT_POSE_MODEL)),
        },
        (None, None) => anyhow::bail!("one of --video or --landmarks is required"),
    };

    println!("  Config:");
    match &input {
        SeedInput::Track(path) => println!("   Landmarks: {}", path.display()),
        SeedInput::Video { path, .. } => println!("   Video:     {}", path.display()),
    }
    println!("   Model dir: {}", config.model_dir.display());
    println!("   Frames:    {}", config.num_frames);
    println!("   Proc fps:  {}", config.proc_fps);
    println!("   Device:    {}", config.device);
    println!("   Output:    {}", config.output_file.display());
    println!();

    // ── Cancellation ───────────────────────────────────────────
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    // ── Pipeline ───────────────────────────────────────────────
    let output_file = config.output_file.clone();
    let task = {
        let cancel = Arc::clone(&cancel);
        tokio::task::spawn_blocking(move || run(config, input, &cancel))
    };
    let output = task
        .await
        .map_err(|e| anyhow::anyhow!("generation task failed: {e}"))??;

    output
        .result
        .save(&output_file)
        .map_err(RuntimeError::from)?;

    print_results(&output);
    println!("  Saved {}", output_file.display());
    println!();
    Ok(())
}

fn run(
    config: RuntimeConfig,
    input: SeedInput,
    cancel: &AtomicBool,
) -> Result<GenerationOutput, RuntimeError> {
    println!("  [1/2] Loading model...");
    let engine = PoseEngine::new(config).load()?;
    println!("        {}", engine.pipeline().graph.summary());
    println!();

    println!("  [2/2] Extracting seed and generating...");
    match input {
        SeedInput::Track(path) => {
            let track = LandmarkTrack::load(&path)?;
            let label = path.display().to_string();
            engine.generate(
                track.into_source(label.clone()),
                TrackExtractor::new(engine.topology()),
                Some(label),
                cancel,
            )
        }
        SeedInput::Video { path, pose_model } => {
            generate_from_video(&engine, path, pose_model, cancel)
        }
    }
}

#[cfg(feature = "video")]
fn generate_from_video(
    engine: &PoseEngine<runtime::Ready>,
    path: PathBuf,
    pose_model: PathBuf,
    cancel: &AtomicBool,
) -> Result<GenerationOutput, RuntimeError> {
    let source = pose_capture::OpenCvVideo::open(&path)?;
    let extractor = pose_capture::OnnxPoseExtractor::new(&pose_model, engine.topology())?;
    engine.generate(source, extractor, Some(path.display().to_string()), cancel)
}

#[cfg(not(feature = "video"))]
fn generate_from_video(
    _engine: &PoseEngine<runtime::Ready>,
    path: PathBuf,
    _pose_model: PathBuf,
    _cancel: &AtomicBool,
) -> Result<GenerationOutput, RuntimeError> {
    Err(pose_capture::CaptureError::ExtractorUnavailable(format!(
        "cannot decode '{}': this build has no video backend (rebuild with --features video, or pass --landmarks)",
        path.display()
    ))
    .into())
}

fn print_results(output: &GenerationOutput) {
    let result = &output.result;
    println!();
    println!("  Results:");
    println!(
        "   Frames: {} seed + {} generated = {}",
        result.seed_frames(),
        result.generated_frames(),
        result.total_frames(),
    );
    println!("   Pose dimension: {}", result.pose_dimension());
    if let Some(report) = &output.seed_report {
        println!(
            "   Seed: {} sampled, {} detections, {} misses, {} degenerate",
            report.frames_sampled, report.detections, report.misses, report.degenerate,
        );
    }
    println!();
    println!("  Metrics:");
    println!("   {}", output.metrics.summary());
    println!();
}
