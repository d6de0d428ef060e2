// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-detect: The detector capability consumed by the scan pipeline,
// a QR detector built on `rqrr`, and the payload parser that tags decoded
// text with its value format.

pub mod detector;
pub mod payload;
pub mod qr;

pub use detector::Detector;
pub use payload::parse_payload;
pub use qr::{QrDetector, unsupported_formats};
