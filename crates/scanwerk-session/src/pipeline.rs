// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline: bounded decode, detection, classification.
//
// Everything here blocks. The driver runs it on a blocking worker.

use chrono::{DateTime, Utc};
use scanwerk_core::classify::{ClassifiedRecord, classify};
use scanwerk_core::config::ScannerConfig;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::ImageReference;
use scanwerk_detect::Detector;
use scanwerk_image::{FileSource, ImageLoader, ImageSource};
use tracing::{info, instrument, warn};

/// What one decode-detect-classify pass produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Classified records, in detector order. Empty means nothing was found.
    pub records: Vec<ClassifiedRecord>,
    pub source_dimensions: (u32, u32),
    pub scale: u32,
    pub scanned_at: DateTime<Utc>,
}

impl ScanOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loader plus detector, run as one unit per captured photo.
pub struct ScanPipeline<D, S = FileSource> {
    loader: ImageLoader<S>,
    detector: D,
}

impl<D: Detector> ScanPipeline<D, FileSource> {
    pub fn from_config(config: &ScannerConfig, detector: D) -> Self {
        Self::new(ImageLoader::from_config(config), detector)
    }
}

impl<D: Detector, S: ImageSource> ScanPipeline<D, S> {
    pub fn new(loader: ImageLoader<S>, detector: D) -> Self {
        Self { loader, detector }
    }

    pub fn detector_operational(&self) -> bool {
        self.detector.is_operational()
    }

    /// Decode the photo at `reference`, detect codes, and classify them.
    ///
    /// The detector is checked before any decode work; a non-operational
    /// detector is never asked to detect.
    #[instrument(skip(self), fields(reference = %reference))]
    pub fn scan(&self, reference: &ImageReference) -> Result<ScanOutcome> {
        if !self.detector.is_operational() {
            warn!("detector not operational, skipping decode");
            return Err(ScanwerkError::DetectorUnavailable);
        }

        let raster = self.loader.load(reference)?;
        let detections = self.detector.detect(&raster);
        let records: Vec<ClassifiedRecord> = detections.iter().map(classify).collect();

        info!(
            detections = detections.len(),
            width = raster.width(),
            height = raster.height(),
            "scan finished"
        );

        Ok(ScanOutcome {
            records,
            source_dimensions: raster.source_dimensions(),
            scale: raster.scale(),
            scanned_at: Utc::now(),
        })
    }
}
