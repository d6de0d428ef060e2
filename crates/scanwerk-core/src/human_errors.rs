// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing messages.
//
// `Notice` covers the short transient messages a capture cycle emits.
// `HumanError` maps every technical error to plain English with a suggestion.
// Both are derived from error kinds, never from error message text.

use serde::{Deserialize, Serialize};

use crate::classify::{DETECTOR_UNAVAILABLE_TEXT, NOTHING_FOUND_TEXT};
use crate::error::ScanwerkError;

/// Transient user-visible message raised by a capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    PermissionDenied,
    ImageLoadFailed,
    NothingFound,
    DetectorUnavailable,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Self::PermissionDenied => "Permission Denied!",
            Self::ImageLoadFailed => "Failed to load Image",
            Self::NothingFound => NOTHING_FOUND_TEXT,
            Self::DetectorUnavailable => DETECTOR_UNAVAILABLE_TEXT,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// The notice a failed cycle step should raise, if any.
pub fn notice_for(err: &ScanwerkError) -> Option<Notice> {
    match err {
        ScanwerkError::PermissionDenied => Some(Notice::PermissionDenied),
        ScanwerkError::ImageUnavailable(_) | ScanwerkError::DecodeFailed(_) => {
            Some(Notice::ImageLoadFailed)
        }
        ScanwerkError::DetectorUnavailable => Some(Notice::DetectorUnavailable),
        _ => None,
    }
}

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing is wrong; the user chose this outcome or can simply try again.
    Transient,
    /// User must do something (grant permission, free storage).
    ActionRequired,
    /// Cannot be fixed by retrying on this device.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether starting a new capture is likely to help.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanwerkError` into a `HumanError`.
pub fn humanize_error(err: &ScanwerkError) -> HumanError {
    match err {
        ScanwerkError::PermissionDenied => HumanError {
            message: "The camera can't be used without permission.".into(),
            suggestion: "Tap Scan again and allow access when asked.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        ScanwerkError::CaptureAborted(_) => HumanError {
            message: "No photo was taken.".into(),
            suggestion: "Tap Scan and take a photo of the code.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::ImageUnavailable(_) => HumanError {
            message: "The photo couldn't be opened.".into(),
            suggestion: "It may have been moved or the app lost access to it. Take the photo again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::DecodeFailed(_) => HumanError {
            message: "The photo couldn't be read.".into(),
            suggestion: "The file may be damaged or too large. Take the photo again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::DetectorUnavailable => HumanError {
            message: "The code reader couldn't be started.".into(),
            suggestion: "This device may not support barcode scanning. Try restarting the app.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanwerkError::InvalidTransition { .. } | ScanwerkError::StaleCompletion { .. } => {
            HumanError {
                message: "The scanner got out of step.".into(),
                suggestion: "Start a new scan.".into(),
                retriable: true,
                severity: Severity::Transient,
            }
        }

        ScanwerkError::CycleInProgress => HumanError {
            message: "A scan is already running.".into(),
            suggestion: "Wait for it to finish, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use its storage.".into(),
                    suggestion: "Check the app's storage permissions, then try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        ScanwerkError::Serialization(_) => HumanError {
            message: "The saved scan couldn't be restored.".into(),
            suggestion: "Start a new scan.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanwerkError::Bridge(_) => HumanError {
            message: "A device-specific feature didn't work.".into(),
            suggestion: "Try restarting the app.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
