// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Decimating frame sampler.
//!
//! The sampler reads every frame from its source and yields every
//! `stride`-th one, where `stride = max(1, round(native_fps / target_fps))`
//! with ties rounded to even (10 fps sampled at 4 fps gives stride 2). It
//! never upsamples. Sources that report a zero, negative or non-finite
//! frame rate are treated as [`DEFAULT_NATIVE_FPS`].

use crate::CaptureError;

/// Frame rate assumed when a source does not report a usable one.
pub const DEFAULT_NATIVE_FPS: f64 = 30.0;

/// Frames read between progress log lines.
const PROGRESS_EVERY: usize = 250;

/// A decodable stream of frames.
pub trait VideoSource {
    /// Decoded image type.
    type Frame;

    /// Frame rate reported by the container, possibly zero or garbage.
    fn native_fps(&self) -> f64;

    /// Total frame count if the container reports one.
    fn frame_count_hint(&self) -> Option<usize> {
        None
    }

    /// Reads the next frame; `Ok(None)` at end of stream.
    fn read_frame(&mut self) -> Result<Option<Self::Frame>, CaptureError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// One frame that survived decimation.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFrame<F> {
    /// Index of the frame in the native stream.
    pub index: usize,
    /// Seconds since the start of the stream (`index / native_fps`).
    pub timestamp: f64,
    pub image: F,
}

/// Computes the decimation stride for a native and a target frame rate.
pub fn stride_for(native_fps: f64, target_fps: f64) -> usize {
    let native = effective_fps(native_fps);
    let ratio = (native / target_fps).round_ties_even();
    if ratio.is_finite() && ratio >= 1.0 {
        ratio as usize
    } else {
        1
    }
}

fn effective_fps(native_fps: f64) -> f64 {
    if native_fps.is_finite() && native_fps > 0.0 {
        native_fps
    } else {
        DEFAULT_NATIVE_FPS
    }
}

/// Lazy iterator over the decimated frames of a [`VideoSource`].
///
/// Yields `Err` at most once (on a decode failure) and then ends.
pub struct FrameSampler<S: VideoSource> {
    source: S,
    fps: f64,
    stride: usize,
    next_index: usize,
    finished: bool,
}

impl<S: VideoSource> FrameSampler<S> {
    /// Wraps `source`, sampling at roughly `target_fps` frames per second.
    ///
    /// # Errors
    /// [`CaptureError::InvalidSamplingRate`] if `target_fps` is not strictly
    /// positive and finite.
    pub fn new(source: S, target_fps: f64) -> Result<Self, CaptureError> {
        if !(target_fps.is_finite() && target_fps > 0.0) {
            return Err(CaptureError::InvalidSamplingRate(target_fps));
        }
        let reported = source.native_fps();
        let fps = effective_fps(reported);
        if fps != reported {
            tracing::warn!(
                source = %source.describe(),
                reported,
                "source reports no usable frame rate, assuming {DEFAULT_NATIVE_FPS}"
            );
        }
        let stride = stride_for(fps, target_fps);
        tracing::debug!(
            source = %source.describe(),
            native_fps = fps,
            target_fps,
            stride,
            frames = ?source.frame_count_hint(),
            "frame sampler ready"
        );
        Ok(Self {
            source,
            fps,
            stride,
            next_index: 0,
            finished: false,
        })
    }

    /// Native frame rate used for timestamps.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Native frames consumed so far.
    pub fn frames_read(&self) -> usize {
        self.next_index
    }

    /// Releases the sampler and returns the underlying source.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: VideoSource> Iterator for FrameSampler<S> {
    type Item = Result<SampledFrame<S::Frame>, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let index = self.next_index;
            let frame = match self.source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    self.finished = true;
                    tracing::debug!(frames = index, "end of stream");
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };
            self.next_index += 1;
            if self.next_index % PROGRESS_EVERY == 0 {
                tracing::debug!(frames = self.next_index, total = ?self.source.frame_count_hint(), "decoding");
            }
            if index % self.stride == 0 {
                return Some(Ok(SampledFrame {
                    index,
                    timestamp: index as f64 / self.fps,
                    image: frame,
                }));
            }
        }
        None
    }
}

// ── In-memory source ───────────────────────────────────────────────

/// A [`VideoSource`] over frames already held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryVideo<F> {
    frames: std::vec::IntoIter<F>,
    total: usize,
    fps: f64,
    label: String,
}

impl<F> InMemoryVideo<F> {
    pub fn new(frames: Vec<F>, fps: f64) -> Self {
        Self::with_label(frames, fps, "in-memory")
    }

    pub fn with_label(frames: Vec<F>, fps: f64, label: impl Into<String>) -> Self {
        Self {
            total: frames.len(),
            frames: frames.into_iter(),
            fps,
            label: label.into(),
        }
    }
}

impl<F> VideoSource for InMemoryVideo<F> {
    type Frame = F;

    fn native_fps(&self) -> f64 {
        self.fps
    }

    fn frame_count_hint(&self) -> Option<usize> {
        Some(self.total)
    }

    fn read_frame(&mut self) -> Result<Option<F>, CaptureError> {
        Ok(self.frames.next())
    }

    fn describe(&self) -> String {
        format!("{} ({} frames)", self.label, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(frames: usize, native: f64, target: f64) -> Vec<usize> {
        let video = InMemoryVideo::new((0..frames).collect::<Vec<_>>(), native);
        FrameSampler::new(video, target)
            .unwrap()
            .map(|f| f.unwrap().index)
            .collect()
    }

    #[test]
    fn test_stride_rounding() {
        assert_eq!(stride_for(30.0, 4.0), 8);
        assert_eq!(stride_for(25.0, 4.0), 6);
        assert_eq!(stride_for(31.0, 4.0), 8);
        assert_eq!(stride_for(30.0, 30.0), 1);
        assert_eq!(stride_for(24.0, 60.0), 1); // never upsample
    }

    #[test]
    fn test_stride_ties_round_to_even() {
        assert_eq!(stride_for(10.0, 4.0), 2); // 2.5
        assert_eq!(stride_for(50.0, 4.0), 12); // 12.5
        assert_eq!(stride_for(30.0, 12.0), 2); // 2.5
        assert_eq!(stride_for(14.0, 4.0), 4); // 3.5
        assert_eq!(stride_for(6.0, 4.0), 2); // 1.5
        assert_eq!(indices(10, 10.0, 4.0), vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_zero_fps_uses_default() {
        assert_eq!(stride_for(0.0, 4.0), 8);
        assert_eq!(stride_for(f64::NAN, 10.0), 3);
        assert_eq!(stride_for(-5.0, 10.0), 3);
    }

    #[test]
    fn test_sampled_indices_and_timestamps() {
        assert_eq!(indices(20, 30.0, 4.0), vec![0, 8, 16]);
        let video = InMemoryVideo::new(vec!['a'; 10], 0.0);
        let frames: Vec<_> = FrameSampler::new(video, 10.0)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[1].index, 3);
        assert!((frames[1].timestamp - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_target_rate() {
        for rate in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let video = InMemoryVideo::new(vec![0u8], 30.0);
            assert!(matches!(
                FrameSampler::new(video, rate),
                Err(CaptureError::InvalidSamplingRate(_))
            ));
        }
    }

    #[test]
    fn test_empty_source() {
        assert!(indices(0, 30.0, 4.0).is_empty());
    }

    struct Failing {
        left: usize,
    }

    impl VideoSource for Failing {
        type Frame = ();
        fn native_fps(&self) -> f64 {
            1.0
        }
        fn read_frame(&mut self) -> Result<Option<()>, CaptureError> {
            if self.left == 0 {
                return Err(CaptureError::Decode {
                    index: 2,
                    reason: "corrupt packet".into(),
                });
            }
            self.left -= 1;
            Ok(Some(()))
        }
        fn describe(&self) -> String {
            "failing".into()
        }
    }

    #[test]
    fn test_decode_error_ends_iteration() {
        let mut sampler = FrameSampler::new(Failing { left: 2 }, 1.0).unwrap();
        assert!(sampler.next().unwrap().is_ok());
        assert!(sampler.next().unwrap().is_ok());
        assert!(sampler.next().unwrap().is_err());
        assert!(sampler.next().is_none());
        assert_eq!(sampler.frames_read(), 2);
    }
}
