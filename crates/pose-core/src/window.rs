// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The sliding pose window fed to the predictor.
//!
//! The window is a fixed-capacity ring buffer that only exists full: it is
//! built from exactly `capacity` seed poses and every push evicts the oldest
//! entry, so its length equals its capacity at every observable point.
//!
//! ```text
//!  slots: [ p4 | p5 | p2 | p3 ]      head = 2
//!                      ▲ oldest
//!  iter(): p2, p3, p4, p5
//! ```

use crate::{PoseError, PoseVector, COORDS_PER_JOINT};
use tensor_core::{Shape, Tensor};

/// Fixed-capacity FIFO of pose vectors.
#[derive(Debug, Clone)]
pub struct PoseWindow {
    slots: Vec<PoseVector>,
    /// Index of the oldest pose.
    head: usize,
    dim: usize,
}

impl PoseWindow {
    /// Builds a full window from exactly `capacity` seed poses.
    ///
    /// # Errors
    /// [`PoseError::SeedLength`] if the seed length differs from `capacity`,
    /// [`PoseError::DimensionMismatch`] if the poses differ in length.
    pub fn from_seed(seed: Vec<PoseVector>, capacity: usize) -> Result<Self, PoseError> {
        if capacity == 0 {
            return Err(PoseError::EmptyWindow);
        }
        if seed.len() != capacity {
            return Err(PoseError::SeedLength {
                capacity,
                actual: seed.len(),
            });
        }
        let dim = seed[0].len();
        if let Some(bad) = seed.iter().find(|p| p.len() != dim) {
            return Err(PoseError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }
        Ok(Self {
            slots: seed,
            head: 0,
            dim,
        })
    }

    /// Appends `pose` as the newest entry and returns the evicted oldest one.
    pub fn push(&mut self, pose: PoseVector) -> Result<PoseVector, PoseError> {
        if pose.len() != self.dim {
            return Err(PoseError::DimensionMismatch {
                expected: self.dim,
                actual: pose.len(),
            });
        }
        let evicted = std::mem::replace(&mut self.slots[self.head], pose);
        self.head = (self.head + 1) % self.slots.len();
        Ok(evicted)
    }

    /// Number of poses held; always equal to [`Self::capacity`].
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Always `false`: a window cannot be built empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Length of each pose vector.
    pub fn pose_dim(&self) -> usize {
        self.dim
    }

    /// The oldest pose.
    pub fn oldest(&self) -> &PoseVector {
        &self.slots[self.head]
    }

    /// The most recently pushed (or last seed) pose.
    pub fn newest(&self) -> &PoseVector {
        let cap = self.slots.len();
        &self.slots[(self.head + cap - 1) % cap]
    }

    /// Iterates poses from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &PoseVector> {
        let (tail, front) = self.slots.split_at(self.head);
        front.iter().chain(tail.iter())
    }

    /// Lays the window out as a `(1, C, T, V)` tensor.
    ///
    /// `value(c, t, v) = window[t][v * C + c]`, with `C` coordinates per
    /// joint, matching the joint-major flattening of each pose.
    pub fn to_tensor(&self) -> Result<Tensor, PoseError> {
        let c_count = COORDS_PER_JOINT;
        if self.dim % c_count != 0 {
            return Err(PoseError::DimensionMismatch {
                expected: self.dim - self.dim % c_count,
                actual: self.dim,
            });
        }
        let joints = self.dim / c_count;
        let t_len = self.len();
        let mut data = vec![0.0f32; self.dim * t_len];
        for (t, pose) in self.iter().enumerate() {
            let values = pose.as_slice();
            for v in 0..joints {
                for c in 0..c_count {
                    data[(c * t_len + t) * joints + v] = values[v * c_count + c];
                }
            }
        }
        Ok(Tensor::from_vec(Shape::nctv(1, c_count, t_len, joints), data)?)
    }
}
