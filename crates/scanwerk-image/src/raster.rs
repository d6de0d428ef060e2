// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoded, bounded raster handed to the detector.

use image::{DynamicImage, GrayImage};

/// A decoded photo at (roughly) the configured resolution bound.
///
/// Consumed once by the detector; never cached.
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
    source_width: u32,
    source_height: u32,
    scale: u32,
}

impl RasterImage {
    pub fn new(image: DynamicImage, source_width: u32, source_height: u32, scale: u32) -> Self {
        Self {
            image,
            source_width,
            source_height,
            scale,
        }
    }

    /// Wrap an in-memory image that was not downsampled.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        Self::new(image, width, height, 1)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Intrinsic dimensions of the photo before downsampling.
    pub fn source_dimensions(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    /// Downsample factor applied during decode.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Luma copy of the raster, the form detectors work on.
    pub fn to_luma8(&self) -> GrayImage {
        self.image.to_luma8()
    }
}
