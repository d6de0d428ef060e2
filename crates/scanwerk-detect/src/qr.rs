// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR code detection using rqrr.

use rqrr::PreparedImage;
use scanwerk_core::config::ScannerConfig;
use scanwerk_core::types::{BarcodeFormat, RawDetection};
use scanwerk_image::RasterImage;
use tracing::{debug, info, instrument, warn};

use crate::detector::Detector;
use crate::payload::parse_payload;

/// Detector backed by rqrr. Only QR symbols are recognised; other
/// configured formats are ignored.
#[derive(Debug, Clone)]
pub struct QrDetector {
    formats: Vec<BarcodeFormat>,
}

impl QrDetector {
    pub fn new(formats: Vec<BarcodeFormat>) -> Self {
        let ignored = unsupported_formats(&formats);
        if !ignored.is_empty() {
            warn!(?ignored, "configured formats not supported by the QR detector");
        }
        Self { formats }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(config.formats.clone())
    }
}

/// Configured formats this detector cannot read.
pub fn unsupported_formats(formats: &[BarcodeFormat]) -> Vec<BarcodeFormat> {
    formats
        .iter()
        .copied()
        .filter(|format| *format != BarcodeFormat::QrCode)
        .collect()
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

impl Detector for QrDetector {
    fn is_operational(&self) -> bool {
        self.formats.contains(&BarcodeFormat::QrCode)
    }

    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    fn detect(&self, image: &RasterImage) -> Vec<RawDetection> {
        let mut prepared = PreparedImage::prepare(image.to_luma8());
        let grids = prepared.detect_grids();
        debug!(candidates = grids.len(), "QR grids located");

        let mut detections = Vec::with_capacity(grids.len());
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => {
                    detections.push(parse_payload(BarcodeFormat::QrCode, &content));
                }
                Err(err) => debug!(error = %err, "skipping undecodable QR grid"),
            }
        }

        info!(count = detections.len(), "QR detection finished");
        detections
    }
}
