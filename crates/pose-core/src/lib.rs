// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # pose-core
//!
//! Pose data types shared by capture, generation and analysis.
//!
//! - [`JointTopology`] — named joint indices of a landmark source
//!   (MediaPipe Pose by default).
//! - [`RawLandmarks`] — one detected frame of 3D joint positions.
//! - [`normalize`] — hip-centred, torso-scaled [`PoseVector`]s.
//! - [`PoseWindow`] — the bounded ring buffer the generator slides.
//! - [`GeneratedSequence`] / [`GenerationResult`] — the append-only output
//!   and its persisted JSON form.
//!
//! # Flattening Convention
//! A pose vector is joint-major: `[j0.x, j0.y, j0.z, j1.x, …]`. Every
//! consumer (window tensors, model output, persisted results) keeps this
//! order so a vector can always be un-flattened back to `(joints, 3)`.

mod error;
mod landmarks;
mod normalize;
mod result;
mod sequence;
mod topology;
mod window;

pub use error::PoseError;
pub use landmarks::{Landmark, RawLandmarks};
pub use normalize::{normalize, normalize_opt, NormalizedPose, PoseVector, TORSO_EPSILON};
pub use result::GenerationResult;
pub use sequence::GeneratedSequence;
pub use topology::{JointTopology, MediaPipeJoint, COORDS_PER_JOINT};
pub use window::PoseWindow;
