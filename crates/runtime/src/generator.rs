// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Autoregressive pose generation.
//!
//! ```text
//!   Seeded ──step()──▶ Generating ──(num_frames reached)──▶ Done
//!
//!   each step:  window ─to_tensor─▶ (1,3,L,V) ─predict─▶ pose
//!               sequence.push(pose);  window.push(pose)  (evicts oldest)
//! ```
//!
//! Steps are strictly sequential: step `k + 1` conditions on the output of
//! step `k`. Predictions are appended as produced, with no clamping or
//! smoothing.

use crate::{PosePredictor, RuntimeError};
use pose_core::{GeneratedSequence, PoseVector, PoseWindow};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tensor_core::Kernel;

/// Lifecycle of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Window filled with the seed; no prediction made yet.
    Seeded,
    /// At least one step taken.
    Generating,
    /// The requested number of frames exists.
    Done,
}

/// Output of a completed run.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub sequence: GeneratedSequence,
    /// Wall-clock time of each step, in order.
    pub step_durations: Vec<Duration>,
}

/// Drives a [`PosePredictor`] over a sliding window.
pub struct AutoregressiveGenerator<'m, P: PosePredictor + ?Sized> {
    predictor: &'m P,
    window: PoseWindow,
    sequence: GeneratedSequence,
    kernel: Kernel,
    state: GeneratorState,
    progress_interval: usize,
}

impl<'m, P: PosePredictor + ?Sized> AutoregressiveGenerator<'m, P> {
    /// Fills the window with `seed`, which must hold exactly
    /// `predictor.seq_len()` poses of `predictor.pose_dim()` values.
    pub fn new(predictor: &'m P, seed: &[PoseVector], kernel: Kernel) -> Result<Self, RuntimeError> {
        if let Some(bad) = seed.iter().find(|p| p.len() != predictor.pose_dim()) {
            return Err(pose_core::PoseError::DimensionMismatch {
                expected: predictor.pose_dim(),
                actual: bad.len(),
            }
            .into());
        }
        let window = PoseWindow::from_seed(seed.to_vec(), predictor.seq_len())?;
        let sequence = GeneratedSequence::from_seed(seed, 0)?;
        Ok(Self {
            predictor,
            window,
            sequence,
            kernel,
            state: GeneratorState::Seeded,
            progress_interval: 0,
        })
    }

    /// Logs progress every `interval` steps (`0` disables it).
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn window(&self) -> &PoseWindow {
        &self.window
    }

    pub fn sequence(&self) -> &GeneratedSequence {
        &self.sequence
    }

    /// Predicts one pose and slides the window.
    pub fn step(&mut self) -> Result<&PoseVector, RuntimeError> {
        let input = self.window.to_tensor()?;
        let pose = self.predictor.predict(&input, self.kernel)?;
        self.sequence.push_prediction(pose.clone())?;
        self.window.push(pose)?;
        self.state = GeneratorState::Generating;
        Ok(self.window.newest())
    }

    /// Runs exactly `num_frames` steps, checking `cancel` before each one.
    ///
    /// # Errors
    /// [`RuntimeError::Cancelled`] if the flag is raised; the partial
    /// sequence is dropped.
    pub fn run(
        mut self,
        num_frames: usize,
        cancel: &AtomicBool,
    ) -> Result<GenerationOutcome, RuntimeError> {
        let mut step_durations = Vec::with_capacity(num_frames);
        for i in 0..num_frames {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!(step = i, "generation cancelled");
                return Err(RuntimeError::Cancelled);
            }
            let started = Instant::now();
            self.step()?;
            step_durations.push(started.elapsed());

            let done = i + 1;
            if self.progress_interval > 0 && done % self.progress_interval == 0 {
                tracing::debug!(step = done, total = num_frames, "generating");
            }
        }
        self.state = GeneratorState::Done;
        Ok(GenerationOutcome {
            sequence: self.sequence,
            step_durations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::Tensor;

    /// Predicts the mean of the window's `x` channel at every coordinate.
    struct MeanX {
        seq_len: usize,
        joints: usize,
    }

    impl PosePredictor for MeanX {
        fn seq_len(&self) -> usize {
            self.seq_len
        }
        fn pose_dim(&self) -> usize {
            self.joints * 3
        }
        fn predict(&self, window: &Tensor, _: Kernel) -> Result<PoseVector, RuntimeError> {
            let plane = self.seq_len * self.joints;
            let mean = window.as_slice()[..plane].iter().sum::<f32>() / plane as f32;
            Ok(PoseVector::new(vec![mean; self.pose_dim()]))
        }
    }

    /// Returns a counter: one more than the newest frame's first value.
    struct Counter;

    impl PosePredictor for Counter {
        fn seq_len(&self) -> usize {
            3
        }
        fn pose_dim(&self) -> usize {
            3
        }
        fn predict(&self, window: &Tensor, _: Kernel) -> Result<PoseVector, RuntimeError> {
            // Channel 0, joint 0, last time step.
            let newest = window.as_slice()[2];
            Ok(PoseVector::new(vec![newest + 1.0; 3]))
        }
    }

    fn seed(len: usize, dim: usize) -> Vec<PoseVector> {
        (0..len).map(|i| PoseVector::new(vec![i as f32; dim])).collect()
    }

    #[test]
    fn test_lengths_for_any_frame_count() {
        let model = MeanX { seq_len: 4, joints: 2 };
        for g in [0, 1, 5, 9] {
            let gen = AutoregressiveGenerator::new(&model, &seed(4, 6), Kernel::Scalar).unwrap();
            let out = gen.run(g, &AtomicBool::new(false)).unwrap();
            assert_eq!(out.sequence.len(), 4 + g);
            assert_eq!(out.sequence.generated_len(), g);
            assert_eq!(out.step_durations.len(), g);
        }
    }

    #[test]
    fn test_zero_frames_returns_seed() {
        let model = MeanX { seq_len: 4, joints: 2 };
        let s = seed(4, 6);
        let gen = AutoregressiveGenerator::new(&model, &s, Kernel::Scalar).unwrap();
        let out = gen.run(0, &AtomicBool::new(false)).unwrap();
        assert_eq!(out.sequence.poses(), s.as_slice());
    }

    #[test]
    fn test_window_slides_with_predictions() {
        let mut gen = AutoregressiveGenerator::new(&Counter, &seed(3, 3), Kernel::Scalar).unwrap();
        assert_eq!(gen.state(), GeneratorState::Seeded);
        for expected in 3..8 {
            let newest = gen.step().unwrap().clone();
            assert_eq!(newest.as_slice(), &[expected as f32; 3]);
            assert_eq!(gen.window().len(), 3);
            assert_eq!(gen.window().newest(), gen.sequence().last().unwrap());
        }
        assert_eq!(gen.state(), GeneratorState::Generating);
        let oldest = gen.window().oldest().as_slice()[0];
        assert_eq!(oldest, 5.0);
    }

    #[test]
    fn test_cancel_before_first_step() {
        let gen = AutoregressiveGenerator::new(&Counter, &seed(3, 3), Kernel::Scalar).unwrap();
        let err = gen.run(10, &AtomicBool::new(true)).unwrap_err();
        assert!(matches!(err, RuntimeError::Cancelled));
    }

    #[test]
    fn test_seed_must_fill_window() {
        let err = AutoregressiveGenerator::new(&Counter, &seed(2, 3), Kernel::Scalar)
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::Pose(_)));
        let err = AutoregressiveGenerator::new(&Counter, &seed(3, 6), Kernel::Scalar)
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::Pose(_)));
    }
}
