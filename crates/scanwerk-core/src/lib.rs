// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk: Core types, error definitions, and result classification shared
// across all crates.

pub mod classify;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use classify::{
    ClassifiedRecord, DETECTOR_UNAVAILABLE_TEXT, NOTHING_FOUND_TEXT, accumulate_results, classify,
    summary_line,
};
pub use config::ScannerConfig;
pub use error::ScanwerkError;
pub use human_errors::Notice;
pub use types::*;
