// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.

use thiserror::Error;

use crate::types::FailureKind;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanwerkError {
    // -- Capture cycle errors --
    #[error("permission to capture was denied")]
    PermissionDenied,

    #[error("capture aborted: {0}")]
    CaptureAborted(String),

    #[error("image unavailable: {0}")]
    ImageUnavailable(String),

    #[error("image decode failed: {0}")]
    DecodeFailed(String),

    #[error("barcode detector is not operational")]
    DetectorUnavailable,

    // -- Session state machine --
    #[error("event `{event}` is not accepted in phase `{phase}`")]
    InvalidTransition { phase: String, event: &'static str },

    #[error("a capture cycle is already in progress")]
    CycleInProgress,

    #[error("capture completion does not match the pending request: expected {expected}, got {actual}")]
    StaleCompletion { expected: String, actual: String },

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),
}

impl ScanwerkError {
    /// The cycle failure this error represents, if it ends a capture cycle
    /// in the `Error` phase.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::CaptureAborted(_) => Some(FailureKind::CaptureAborted),
            Self::ImageUnavailable(_) => Some(FailureKind::ImageUnavailable),
            Self::DecodeFailed(_) => Some(FailureKind::DecodeFailed),
            Self::DetectorUnavailable => Some(FailureKind::DetectorUnavailable),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanwerkError>;
