// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-session: The capture cycle.
//
// `machine` holds the pure state machine, `persist` the suspend/resume
// payload, `pipeline` the blocking decode-detect-classify step, and `driver`
// the async loop that wires those to a platform bridge.

pub mod driver;
pub mod machine;
pub mod persist;
pub mod pipeline;

pub use driver::{CancelHandle, Scanner};
pub use machine::{CaptureSession, Effect, Event, MachineContext, Transition};
pub use persist::SavedSession;
pub use pipeline::{ScanOutcome, ScanPipeline};
