// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-bridge: Platform collaborator abstractions.
//
// The capture cycle never talks to a camera or permission dialog directly.
// It hands a reply channel to a bridge and awaits exactly one answer.

pub mod desktop;
pub mod traits;

use std::path::PathBuf;

use scanwerk_core::config::ScannerConfig;

/// Build the bridge for the current platform.
///
/// Only the desktop bridge ships today. `photo` is the file it hands back as
/// the captured image; `None` makes every capture a cancellation.
pub fn platform_bridge(config: &ScannerConfig, photo: Option<PathBuf>) -> Box<dyn traits::PlatformBridge> {
    Box::new(desktop::DesktopBridge::new(config.auto_grant_permission, photo))
}
