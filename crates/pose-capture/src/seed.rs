// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Seed sequence builder.
//!
//! Scans sampled frames in order, keeps every frame whose landmarks were
//! detected and normalised, and stops as soon as `seq_len` poses exist.
//! Frames without a detection are skipped silently. If the whole source
//! runs out first the build fails with
//! [`CaptureError::InsufficientSeedData`]; the seed is never padded.

use crate::{CaptureError, FrameSampler, LandmarkExtractor, VideoSource};
use pose_core::{normalize, JointTopology, PoseVector};
use std::sync::atomic::{AtomicBool, Ordering};

/// Counters describing how a seed was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SeedReport {
    /// Sampled frames handed to the extractor.
    pub frames_sampled: usize,
    /// Frames with a detection.
    pub detections: usize,
    /// Frames without a detection.
    pub misses: usize,
    /// Detections normalised with the degenerate-torso fallback.
    pub degenerate: usize,
}

/// The first `seq_len` valid poses of a video, in temporal order.
#[derive(Debug, Clone)]
pub struct SeedSequence {
    pub poses: Vec<PoseVector>,
    /// Native frame index of each pose.
    pub frame_indices: Vec<usize>,
    pub report: SeedReport,
}

/// Builds seed sequences of a fixed length.
#[derive(Debug, Clone)]
pub struct SeedBuilder {
    seq_len: usize,
    topology: JointTopology,
}

impl SeedBuilder {
    pub fn new(seq_len: usize, topology: JointTopology) -> Self {
        Self { seq_len, topology }
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Collects the seed from `sampler` using `extractor`.
    pub fn build<S, E>(
        &self,
        sampler: FrameSampler<S>,
        extractor: E,
    ) -> Result<SeedSequence, CaptureError>
    where
        S: VideoSource,
        E: LandmarkExtractor<S::Frame>,
    {
        self.build_cancellable(sampler, extractor, &AtomicBool::new(false))
    }

    /// Like [`Self::build`], checking `cancel` before each sampled frame.
    pub fn build_cancellable<S, E>(
        &self,
        mut sampler: FrameSampler<S>,
        mut extractor: E,
        cancel: &AtomicBool,
    ) -> Result<SeedSequence, CaptureError>
    where
        S: VideoSource,
        E: LandmarkExtractor<S::Frame>,
    {
        let mut poses = Vec::with_capacity(self.seq_len);
        let mut frame_indices = Vec::with_capacity(self.seq_len);
        let mut report = SeedReport::default();

        while poses.len() < self.seq_len {
            if cancel.load(Ordering::Relaxed) {
                return Err(CaptureError::Cancelled);
            }
            let Some(frame) = sampler.next() else {
                break;
            };
            let frame = frame?;
            report.frames_sampled += 1;

            let Some(landmarks) = extractor.extract(&frame.image)? else {
                report.misses += 1;
                continue;
            };
            report.detections += 1;

            let normalized = normalize(&landmarks, &self.topology)?;
            if normalized.degenerate {
                report.degenerate += 1;
            }
            poses.push(normalized.vector);
            frame_indices.push(frame.index);
        }

        if poses.len() < self.seq_len {
            return Err(CaptureError::InsufficientSeedData {
                found: poses.len(),
                required: self.seq_len,
            });
        }

        if report.degenerate > 0 {
            tracing::warn!(
                degenerate = report.degenerate,
                "seed contains poses with a degenerate torso; they were left unscaled"
            );
        }
        tracing::info!(
            extractor = extractor.name(),
            poses = poses.len(),
            sampled = report.frames_sampled,
            misses = report.misses,
            "seed sequence extracted"
        );

        Ok(SeedSequence {
            poses,
            frame_indices,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryVideo, LandmarkTrack, TrackExtractor, TrackFrame};
    use pose_core::RawLandmarks;
    use std::cell::Cell;
    use std::rc::Rc;

    fn body(offset: f32) -> Vec<[f32; 3]> {
        let t = JointTopology::MEDIAPIPE_POSE;
        let mut pts = vec![[offset, offset, 0.0]; 33];
        pts[t.left_hip] = [offset - 0.1, offset, 0.0];
        pts[t.right_hip] = [offset + 0.1, offset, 0.0];
        pts[t.left_shoulder] = [offset - 0.1, offset - 0.5, 0.0];
        pts[t.right_shoulder] = [offset + 0.1, offset - 0.5, 0.0];
        pts
    }

    fn track(pattern: &[bool]) -> InMemoryVideo<TrackFrame> {
        let frames = pattern
            .iter()
            .enumerate()
            .map(|(i, &hit)| hit.then(|| body(i as f32)))
            .collect();
        LandmarkTrack::new(30.0, frames).into_source("test")
    }

    fn builder(seq_len: usize) -> SeedBuilder {
        SeedBuilder::new(seq_len, JointTopology::MEDIAPIPE_POSE)
    }

    #[test]
    fn test_skips_misses_and_keeps_order() {
        let sampler = FrameSampler::new(track(&[true, false, true, false, true, true]), 30.0).unwrap();
        let seed = builder(3).build(sampler, TrackExtractor::default()).unwrap();
        assert_eq!(seed.poses.len(), 3);
        assert_eq!(seed.frame_indices, vec![0, 2, 4]);
        assert_eq!(seed.report.misses, 2);
        assert_eq!(seed.report.detections, 3);
    }

    /// Counts decoder reads so tests can see how far the sampler went.
    struct Counted {
        inner: InMemoryVideo<TrackFrame>,
        reads: Rc<Cell<usize>>,
    }

    impl VideoSource for Counted {
        type Frame = TrackFrame;
        fn native_fps(&self) -> f64 {
            self.inner.native_fps()
        }
        fn read_frame(&mut self) -> Result<Option<TrackFrame>, CaptureError> {
            self.reads.set(self.reads.get() + 1);
            self.inner.read_frame()
        }
        fn describe(&self) -> String {
            "counted".into()
        }
    }

    #[test]
    fn test_full_seed_decodes_no_further_frames() {
        let reads = Rc::new(Cell::new(0));
        let source = Counted {
            inner: track(&[true, false, true, true, true, true, true]),
            reads: Rc::clone(&reads),
        };
        let sampler = FrameSampler::new(source, 30.0).unwrap();
        let seed = builder(4).build(sampler, TrackExtractor::default()).unwrap();
        assert_eq!(seed.frame_indices, vec![0, 2, 3, 4]);
        assert_eq!(reads.get(), 5);
    }

    #[test]
    fn test_stops_after_seq_len() {
        let sampler = FrameSampler::new(track(&[true; 10]), 30.0).unwrap();
        let seed = builder(4).build(sampler, TrackExtractor::default()).unwrap();
        assert_eq!(seed.frame_indices, vec![0, 1, 2, 3]);
        assert_eq!(seed.report.frames_sampled, 4);
    }

    #[test]
    fn test_one_short_is_insufficient() {
        let mut pattern = vec![true; 31];
        pattern.extend([false; 5]);
        let sampler = FrameSampler::new(track(&pattern), 30.0).unwrap();
        let err = builder(32).build(sampler, TrackExtractor::default()).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::InsufficientSeedData { found: 31, required: 32 }
        ));
    }

    #[test]
    fn test_exactly_enough() {
        let sampler = FrameSampler::new(track(&[true; 32]), 30.0).unwrap();
        let seed = builder(32).build(sampler, TrackExtractor::default()).unwrap();
        assert_eq!(seed.poses.len(), 32);
        assert!(seed.poses.iter().all(|p| p.len() == 99));
    }

    #[test]
    fn test_cancelled() {
        let sampler = FrameSampler::new(track(&[true; 4]), 30.0).unwrap();
        let cancel = AtomicBool::new(true);
        let err = builder(2)
            .build_cancellable(sampler, TrackExtractor::default(), &cancel)
            .unwrap_err();
        assert!(matches!(err, CaptureError::Cancelled));
    }

    struct Broken;

    impl LandmarkExtractor<TrackFrame> for Broken {
        fn extract(&mut self, _: &TrackFrame) -> Result<Option<RawLandmarks>, CaptureError> {
            Err(CaptureError::ExtractorUnavailable("model not loaded".into()))
        }
    }

    #[test]
    fn test_extractor_failure_is_fatal() {
        let sampler = FrameSampler::new(track(&[true; 4]), 30.0).unwrap();
        let err = builder(2).build(sampler, Broken).unwrap_err();
        assert!(matches!(err, CaptureError::ExtractorUnavailable(_)));
    }

    #[test]
    fn test_degenerate_poses_are_counted() {
        let frames = vec![Some(vec![[0.2, 0.2, 0.2]; 33]); 2];
        let source = LandmarkTrack::new(30.0, frames).into_source("flat");
        let sampler = FrameSampler::new(source, 30.0).unwrap();
        let seed = builder(2).build(sampler, TrackExtractor::default()).unwrap();
        assert_eq!(seed.report.degenerate, 2);
        assert!(seed.poses.iter().all(|p| p.is_finite()));
    }
}
