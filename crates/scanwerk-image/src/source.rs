// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Where photo bytes come from. Each `open` hands out a fresh reader that is
// released when dropped.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek};

use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::ImageReference;
use tracing::debug;

/// A resolver from image references to readable streams.
pub trait ImageSource {
    type Reader: BufRead + Seek;

    /// Open a new stream over the referenced bytes.
    ///
    /// Fails with `ImageUnavailable` when the bytes cannot be reached.
    fn open(&self, reference: &ImageReference) -> Result<Self::Reader>;
}

/// Reads references as local files (`file://` URIs or bare paths).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl ImageSource for FileSource {
    type Reader = BufReader<File>;

    fn open(&self, reference: &ImageReference) -> Result<Self::Reader> {
        let path = reference.to_path();
        let file = File::open(&path).map_err(|err| {
            ScanwerkError::ImageUnavailable(format!("{}: {}", path.display(), err))
        })?;
        debug!(path = %path.display(), "Image stream opened");
        Ok(BufReader::new(file))
    }
}
