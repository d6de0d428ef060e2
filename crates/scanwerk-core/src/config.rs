// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use serde::{Deserialize, Serialize};

use crate::types::BarcodeFormat;

/// How the integer downsample factor is rounded before decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRounding {
    /// Use the computed factor as-is.
    #[default]
    Exact,
    /// Round down to the nearest power of two, for decoders that only
    /// subsample by powers of two.
    PowerOfTwo,
}

/// Persistent scanner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Upper bound on decoded raster width, in pixels.
    pub max_width: u32,
    /// Upper bound on decoded raster height, in pixels.
    pub max_height: u32,
    pub sample_rounding: SampleRounding,
    /// Allocation budget handed to the image decoder for the full pass.
    pub decode_budget_bytes: u64,
    /// Symbologies the detector should look for. The shipped detector reads
    /// QR only.
    pub formats: Vec<BarcodeFormat>,
    /// File name the camera collaborator writes the photo to.
    pub capture_file_name: String,
    /// Start every cycle with empty result text instead of appending.
    pub clear_results_on_new_cycle: bool,
    /// Desktop bridge: grant the capture permission without asking.
    pub auto_grant_permission: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_width: 600,
            max_height: 600,
            sample_rounding: SampleRounding::Exact,
            decode_budget_bytes: 256 * 1024 * 1024,
            formats: vec![BarcodeFormat::QrCode],
            capture_file_name: "picture.jpg".into(),
            clear_results_on_new_cycle: false,
            auto_grant_permission: true,
        }
    }
}
