// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the capture collaborators.
//
// Permission and camera calls are asynchronous on every real platform: the
// caller passes a single-shot reply sender and the platform answers through
// it whenever the user is done. Dropping the sender without answering is how
// a platform signals that it lost track of the request.

use scanwerk_core::error::Result;
use scanwerk_core::human_errors::Notice;
use scanwerk_core::types::{CaptureCompletion, CaptureRequest, PermissionOutcome};
use tokio::sync::oneshot;

/// Single-shot reply channel handed to a collaborator.
pub type Reply<T> = oneshot::Sender<T>;

/// Unified bridge that groups every collaborator the capture cycle needs.
pub trait PlatformBridge: NativePermissions + NativeCamera + NativeNotifier + Send + Sync {
    /// Human-readable platform name (e.g. "Desktop", "Android 14").
    fn platform_name(&self) -> &str;
}

/// Runtime permission prompt for camera access.
pub trait NativePermissions {
    /// Ask for capture permission. The outcome is sent on `reply`.
    fn request_capture_permission(&self, reply: Reply<PermissionOutcome>);
}

/// External capture activity.
pub trait NativeCamera {
    /// Start a capture that writes to `request.reference`.
    ///
    /// On success the image bytes are at that exact reference before the
    /// completion is sent. On cancel or failure nothing is written.
    /// Returns an error only if the capture could not be launched at all.
    fn launch_capture(&self, request: CaptureRequest, reply: Reply<CaptureCompletion>) -> Result<()>;
}

/// Transient user-visible messages.
pub trait NativeNotifier {
    fn notify(&self, notice: Notice);
}
