// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detector capability.

use scanwerk_core::types::RawDetection;
use scanwerk_image::RasterImage;

/// A barcode detector: raster in, ordered detections out.
///
/// Detection is synchronous and may take a while on large rasters; callers
/// on an interactive thread should move it onto a blocking worker.
pub trait Detector: Send + Sync {
    /// Whether the detector can be used at all. Checked before every `detect`.
    fn is_operational(&self) -> bool;

    /// Locate and decode every code in `image`, in the detector's own order.
    fn detect(&self, image: &RasterImage) -> Vec<RawDetection>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn is_operational(&self) -> bool {
        (**self).is_operational()
    }

    fn detect(&self, image: &RasterImage) -> Vec<RawDetection> {
        (**self).detect(image)
    }
}

impl<D: Detector + ?Sized> Detector for std::sync::Arc<D> {
    fn is_operational(&self) -> bool {
        (**self).is_operational()
    }

    fn detect(&self, image: &RasterImage) -> Vec<RawDetection> {
        (**self).detect(image)
    }
}
