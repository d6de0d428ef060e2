// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge for builds without a native camera.
//
// Permission is answered from configuration. A "capture" copies an existing
// photo file to the requested reference. Notices go to the log and stderr.

use std::path::PathBuf;

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::human_errors::Notice;
use scanwerk_core::types::{CaptureCompletion, CaptureOutcome, CaptureRequest, PermissionOutcome};
use tracing::{info, warn};

use crate::traits::*;

/// Bridge used on desktop and in CI.
#[derive(Debug, Clone)]
pub struct DesktopBridge {
    grant_permission: bool,
    photo: Option<PathBuf>,
}

impl DesktopBridge {
    pub fn new(grant_permission: bool, photo: Option<PathBuf>) -> Self {
        Self {
            grant_permission,
            photo,
        }
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        "Desktop"
    }
}

impl NativePermissions for DesktopBridge {
    fn request_capture_permission(&self, reply: Reply<PermissionOutcome>) {
        let outcome = if self.grant_permission {
            PermissionOutcome::Granted
        } else {
            PermissionOutcome::Denied
        };
        info!(?outcome, "desktop permission prompt answered");
        if reply.send(outcome).is_err() {
            warn!("permission reply dropped by receiver");
        }
    }
}

impl NativeCamera for DesktopBridge {
    fn launch_capture(&self, request: CaptureRequest, reply: Reply<CaptureCompletion>) -> Result<()> {
        let target = request.reference.to_path();
        if target.as_os_str().is_empty() {
            return Err(ScanwerkError::Bridge("capture target is empty".into()));
        }

        let outcome = match &self.photo {
            None => {
                info!(request = %request.id, "no photo configured, capture cancelled");
                CaptureOutcome::Cancelled
            }
            Some(photo) => match std::fs::copy(photo, &target) {
                Ok(bytes) => {
                    info!(request = %request.id, bytes, target = %target.display(), "photo captured");
                    CaptureOutcome::Saved
                }
                Err(e) => {
                    warn!(request = %request.id, error = %e, "photo copy failed");
                    CaptureOutcome::Failed(e.to_string())
                }
            },
        };

        if reply
            .send(CaptureCompletion {
                id: request.id,
                outcome,
            })
            .is_err()
        {
            warn!(request = %request.id, "capture reply dropped by receiver");
        }
        Ok(())
    }
}

impl NativeNotifier for DesktopBridge {
    fn notify(&self, notice: Notice) {
        warn!(?notice, "{}", notice.text());
        eprintln!("{notice}");
    }
}
