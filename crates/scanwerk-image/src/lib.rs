// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-image: Turns a stored photo into a raster no larger than the
// configured bound, without decoding more than the allocation budget allows.

pub mod loader;
pub mod raster;
pub mod source;

pub use loader::{ImageLoader, downsample_factor};
pub use raster::RasterImage;
pub use source::{FileSource, ImageSource};
