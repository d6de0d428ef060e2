// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Two-pass bounded decode.
//
// Pass one opens the stream, reads only the header, and closes it. The
// downsample factor is derived from the intrinsic dimensions and the bound.
// Pass two reopens the stream and decodes under the allocation budget, then
// reduces the raster by the factor. Each stream lives in its own scope, so it
// is released on every exit path.

use image::error::ImageError;
use image::{ImageReader, Limits};
use scanwerk_core::config::{SampleRounding, ScannerConfig};
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::types::ImageReference;
use tracing::{debug, info, instrument};

use crate::raster::RasterImage;
use crate::source::{FileSource, ImageSource};

/// Integer downsample factor for a photo of `photo_width` x `photo_height`
/// decoded within `max_width` x `max_height`.
///
/// `floor(min(photo_w / max_w, photo_h / max_h))`, never below 1, so photos
/// smaller than the bound decode at full resolution. With
/// `SampleRounding::PowerOfTwo` the factor rounds down to a power of two.
pub fn downsample_factor(
    photo_width: u32,
    photo_height: u32,
    max_width: u32,
    max_height: u32,
    rounding: SampleRounding,
) -> u32 {
    let by_width = photo_width / max_width.max(1);
    let by_height = photo_height / max_height.max(1);
    let scale = by_width.min(by_height).max(1);
    match rounding {
        SampleRounding::Exact => scale,
        SampleRounding::PowerOfTwo => 1 << scale.ilog2(),
    }
}

/// Decodes image references into bounded rasters.
pub struct ImageLoader<S = FileSource> {
    source: S,
    max_width: u32,
    max_height: u32,
    rounding: SampleRounding,
    decode_budget_bytes: u64,
}

impl ImageLoader<FileSource> {
    /// A file-backed loader using the configured bounds.
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::with_source(FileSource, config)
    }
}

impl<S: ImageSource> ImageLoader<S> {
    pub fn with_source(source: S, config: &ScannerConfig) -> Self {
        Self {
            source,
            max_width: config.max_width,
            max_height: config.max_height,
            rounding: config.sample_rounding,
            decode_budget_bytes: config.decode_budget_bytes,
        }
    }

    /// Decode `reference` within the configured bounds.
    pub fn load(&self, reference: &ImageReference) -> Result<RasterImage> {
        self.decode_bounded(reference, self.max_width, self.max_height)
    }

    /// Decode `reference` into a raster bounded by `max_width` x `max_height`.
    ///
    /// Opens the underlying stream exactly twice. Unreachable bytes fail with
    /// `ImageUnavailable`; unreadable contents with `DecodeFailed`.
    #[instrument(skip(self), fields(reference = %reference))]
    pub fn decode_bounded(
        &self,
        reference: &ImageReference,
        max_width: u32,
        max_height: u32,
    ) -> Result<RasterImage> {
        let (photo_width, photo_height) = self.probe(reference)?;
        if photo_width == 0 || photo_height == 0 {
            return Err(ScanwerkError::DecodeFailed(format!(
                "{reference}: image has no pixels ({photo_width}x{photo_height})"
            )));
        }

        let scale = downsample_factor(
            photo_width,
            photo_height,
            max_width,
            max_height,
            self.rounding,
        );
        debug!(photo_width, photo_height, scale, "Downsample factor chosen");

        let decoded = {
            let reader = self.source.open(reference)?;
            let mut decoder = ImageReader::new(reader)
                .with_guessed_format()
                .map_err(|err| ScanwerkError::ImageUnavailable(format!("{reference}: {err}")))?;
            let mut limits = Limits::default();
            limits.max_alloc = Some(self.decode_budget_bytes);
            decoder.limits(limits);
            decoder
                .decode()
                .map_err(|err| image_error(reference, err))?
        };

        let raster = if scale > 1 {
            let width = decoded.width().div_ceil(scale);
            let height = decoded.height().div_ceil(scale);
            decoded.thumbnail_exact(width, height)
        } else {
            decoded
        };

        info!(
            width = raster.width(),
            height = raster.height(),
            scale,
            "Image decoded"
        );
        Ok(RasterImage::new(raster, photo_width, photo_height, scale))
    }

    /// Read the intrinsic dimensions without decoding pixel data.
    fn probe(&self, reference: &ImageReference) -> Result<(u32, u32)> {
        let reader = self.source.open(reference)?;
        ImageReader::new(reader)
            .with_guessed_format()
            .map_err(|err| ScanwerkError::ImageUnavailable(format!("{reference}: {err}")))?
            .into_dimensions()
            .map_err(|err| image_error(reference, err))
    }
}

/// Map a decoder error onto the cycle's failure kinds.
///
/// A stream that ends early or carries garbage is corrupt data; any other I/O
/// failure means the bytes could not be reached.
fn image_error(reference: &ImageReference, err: ImageError) -> ScanwerkError {
    match &err {
        ImageError::IoError(io)
            if !matches!(
                io.kind(),
                std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::InvalidData
            ) =>
        {
            ScanwerkError::ImageUnavailable(format!("{reference}: {err}"))
        }
        _ => ScanwerkError::DecodeFailed(format!("{reference}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{DynamicImage, GrayImage, ImageFormat, Luma};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([180u8])));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    /// Serves fixed bytes and counts how many streams were opened and dropped.
    struct CountingSource {
        bytes: Vec<u8>,
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    struct CountingReader {
        inner: Cursor<Vec<u8>>,
        closed: Arc<AtomicUsize>,
    }

    impl std::io::Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl std::io::BufRead for CountingReader {
        fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
            self.inner.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.inner.consume(amt)
        }
    }

    impl std::io::Seek for CountingReader {
        fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl Drop for CountingReader {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ImageSource for CountingSource {
        type Reader = CountingReader;

        fn open(&self, _reference: &ImageReference) -> Result<Self::Reader> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(CountingReader {
                inner: Cursor::new(self.bytes.clone()),
                closed: Arc::clone(&self.closed),
            })
        }
    }

    fn counting_loader(bytes: Vec<u8>) -> (ImageLoader<CountingSource>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            bytes,
            opened: Arc::clone(&opened),
            closed: Arc::clone(&closed),
        };
        (
            ImageLoader::with_source(source, &ScannerConfig::default()),
            opened,
            closed,
        )
    }

    fn reference() -> ImageReference {
        ImageReference::new("memory://photo")
    }

    #[test]
    fn factor_floors_the_smaller_ratio() {
        assert_eq!(downsample_factor(2400, 1800, 600, 600, SampleRounding::Exact), 3);
        assert_eq!(downsample_factor(4000, 3000, 600, 600, SampleRounding::Exact), 5);
        assert_eq!(downsample_factor(1300, 700, 600, 600, SampleRounding::Exact), 1);
    }

    #[test]
    fn factor_never_upsamples() {
        assert_eq!(downsample_factor(100, 80, 600, 600, SampleRounding::Exact), 1);
        assert_eq!(downsample_factor(1, 1, 600, 600, SampleRounding::Exact), 1);
    }

    #[test]
    fn power_of_two_rounds_down() {
        assert_eq!(downsample_factor(2400, 1800, 600, 600, SampleRounding::PowerOfTwo), 2);
        assert_eq!(downsample_factor(4000, 3000, 600, 600, SampleRounding::PowerOfTwo), 4);
        assert_eq!(downsample_factor(4800, 4800, 600, 600, SampleRounding::PowerOfTwo), 8);
        assert_eq!(downsample_factor(300, 300, 600, 600, SampleRounding::PowerOfTwo), 1);
    }

    #[test]
    fn factor_matches_formula_across_grid() {
        for photo_w in [1u32, 7, 599, 600, 601, 1199, 1200, 3001] {
            for photo_h in [1u32, 5, 600, 1800, 2999] {
                for (max_w, max_h) in [(1u32, 1u32), (600, 600), (640, 480), (1000, 10)] {
                    let expected = (photo_w / max_w).min(photo_h / max_h).max(1);
                    assert_eq!(
                        downsample_factor(photo_w, photo_h, max_w, max_h, SampleRounding::Exact),
                        expected
                    );
                }
            }
        }
    }

    #[test]
    fn large_photo_is_reduced_by_factor() {
        let (loader, _, _) = counting_loader(png_bytes(2400, 1800));
        let raster = loader.decode_bounded(&reference(), 600, 600).unwrap();
        assert_eq!(raster.scale(), 3);
        assert_eq!((raster.width(), raster.height()), (800, 600));
        assert_eq!(raster.source_dimensions(), (2400, 1800));
    }

    #[test]
    fn odd_dimensions_round_up_within_bound() {
        let (loader, _, _) = counting_loader(png_bytes(1201, 1203));
        let raster = loader.decode_bounded(&reference(), 600, 600).unwrap();
        assert_eq!(raster.scale(), 2);
        assert!(raster.width() <= 1201u32.div_ceil(2));
        assert!(raster.height() <= 1203u32.div_ceil(2));
    }

    #[test]
    fn small_photo_decodes_unscaled() {
        let (loader, _, _) = counting_loader(png_bytes(120, 90));
        let raster = loader.load(&reference()).unwrap();
        assert_eq!(raster.scale(), 1);
        assert_eq!((raster.width(), raster.height()), (120, 90));
    }

    #[test]
    fn stream_opened_and_released_twice() {
        let (loader, opened, closed) = counting_loader(png_bytes(64, 64));
        loader.load(&reference()).unwrap();
        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn truncated_body_fails_and_releases_both_streams() {
        let mut bytes = png_bytes(64, 64);
        bytes.truncate(bytes.len() / 2);
        let (loader, opened, closed) = counting_loader(bytes);

        let err = loader.load(&reference()).unwrap_err();
        assert!(matches!(err, ScanwerkError::DecodeFailed(_)), "got {err:?}");
        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let (loader, opened, closed) = counting_loader(b"definitely not an image".to_vec());
        let err = loader.load(&reference()).unwrap_err();
        assert!(matches!(err, ScanwerkError::DecodeFailed(_)), "got {err:?}");
        assert_eq!(opened.load(Ordering::SeqCst), closed.load(Ordering::SeqCst));
    }

    #[test]
    fn allocation_budget_is_enforced() {
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            bytes: png_bytes(256, 256),
            opened,
            closed: Arc::clone(&closed),
        };
        let config = ScannerConfig {
            decode_budget_bytes: 1024,
            ..ScannerConfig::default()
        };
        let loader = ImageLoader::with_source(source, &config);

        let err = loader.load(&reference()).unwrap_err();
        assert!(matches!(err, ScanwerkError::DecodeFailed(_)), "got {err:?}");
        assert_eq!(closed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ImageLoader::from_config(&ScannerConfig::default());
        let err = loader
            .load(&ImageReference::from_path(dir.path().join("picture.jpg")))
            .unwrap_err();
        assert!(matches!(err, ScanwerkError::ImageUnavailable(_)));
    }

    #[test]
    fn file_reference_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picture.png");
        std::fs::write(&path, png_bytes(1800, 1200)).unwrap();

        let loader = ImageLoader::from_config(&ScannerConfig::default());
        let raster = loader.load(&ImageReference::from_path(&path)).unwrap();
        assert_eq!(raster.scale(), 2);
        assert_eq!((raster.width(), raster.height()), (900, 600));
    }
}
