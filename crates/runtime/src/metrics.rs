// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Generation profiling metrics.
//!
//! [`GenerationMetrics`] collects load, seeding and per-step timings for
//! one run, plus the device the run executed on.

use std::time::Duration;

/// Aggregate metrics for a generation run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GenerationMetrics {
    /// Time spent loading the pipeline (zero if it was loaded earlier).
    pub load_duration: Duration,
    /// Time spent sampling frames and building the seed.
    pub seed_duration: Duration,
    /// Total wall-clock time for the run, seeding included.
    pub total_duration: Duration,
    /// Per-step timings; empty when profiling is disabled.
    pub step_durations: Vec<Duration>,
    /// Poses in the seed.
    pub seed_frames: usize,
    /// Poses predicted.
    pub frames_generated: usize,
    /// Device label, e.g. `"cpu-simd (avx2+fma)"`.
    pub device: String,
}

impl GenerationMetrics {
    /// Creates an empty metrics container.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            load_duration: Duration::ZERO,
            seed_duration: Duration::ZERO,
            total_duration: Duration::ZERO,
            step_durations: Vec::new(),
            seed_frames: 0,
            frames_generated: 0,
            device: device.into(),
        }
    }

    /// Finalises metrics with the total wall-clock time and frame counts.
    pub fn finalise(&mut self, total: Duration, seed_frames: usize, generated: usize) {
        self.total_duration = total;
        self.seed_frames = seed_frames;
        self.frames_generated = generated;
    }

    /// Time spent inside prediction steps.
    pub fn generation_duration(&self) -> Duration {
        self.step_durations.iter().sum()
    }

    /// Generated frames per second of total run time.
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs <= 0.0 || self.frames_generated == 0 {
            return 0.0;
        }
        self.frames_generated as f64 / secs
    }

    /// Mean step time, if any steps were recorded.
    pub fn mean_step(&self) -> Option<Duration> {
        let n = u32::try_from(self.step_durations.len()).ok().filter(|&n| n > 0)?;
        Some(self.generation_duration() / n)
    }

    /// Slowest recorded step.
    pub fn max_step(&self) -> Option<Duration> {
        self.step_durations.iter().max().copied()
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        let steps = match (self.mean_step(), self.max_step()) {
            (Some(mean), Some(max)) => {
                format!(", step mean {:.2}ms / max {:.2}ms", ms(mean), ms(max))
            }
            _ => String::new(),
        };
        format!(
            "Generation: {:.2}ms total ({:.2}ms seed), {} seed + {} generated frames \
             ({:.1} frames/s) on {}{}",
            ms(self.total_duration),
            ms(self.seed_duration),
            self.seed_frames,
            self.frames_generated,
            self.frames_per_second(),
            self.device,
            steps,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics() {
        let m = GenerationMetrics::new("cpu");
        assert_eq!(m.frames_per_second(), 0.0);
        assert_eq!(m.mean_step(), None);
    }

    #[test]
    fn test_step_statistics() {
        let mut m = GenerationMetrics::new("cpu");
        m.step_durations = vec![
            Duration::from_millis(2),
            Duration::from_millis(4),
            Duration::from_millis(6),
        ];
        m.finalise(Duration::from_millis(30), 32, 3);
        assert_eq!(m.generation_duration(), Duration::from_millis(12));
        assert_eq!(m.mean_step(), Some(Duration::from_millis(4)));
        assert_eq!(m.max_step(), Some(Duration::from_millis(6)));
        assert!((m.frames_per_second() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_summary_format() {
        let mut m = GenerationMetrics::new("cpu-simd (neon)");
        m.finalise(Duration::from_secs(1), 32, 10);
        let s = m.summary();
        assert!(s.contains("Generation:"));
        assert!(s.contains("32 seed + 10 generated"));
        assert!(s.contains("neon"));
        assert!(!s.contains("step mean"));
    }
}
