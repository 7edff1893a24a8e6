// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Landmark extractor abstraction.

use crate::CaptureError;
use pose_core::RawLandmarks;

/// Detects body landmarks in a single image of type `I`.
///
/// Implementations return `Ok(None)` for an ordinary miss (occlusion,
/// motion blur, nobody in frame). `Err` is reserved for conditions that make
/// the extractor unusable, which abort seeding.
pub trait LandmarkExtractor<I> {
    fn extract(&mut self, image: &I) -> Result<Option<RawLandmarks>, CaptureError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "landmark-extractor"
    }
}

impl<I, E: LandmarkExtractor<I> + ?Sized> LandmarkExtractor<I> for &mut E {
    fn extract(&mut self, image: &I) -> Result<Option<RawLandmarks>, CaptureError> {
        (**self).extract(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<I, E: LandmarkExtractor<I> + ?Sized> LandmarkExtractor<I> for Box<E> {
    fn extract(&mut self, image: &I) -> Result<Option<RawLandmarks>, CaptureError> {
        (**self).extract(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
