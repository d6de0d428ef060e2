// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the bounded two-pass decode.

use std::io::Cursor;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use scanwerk_core::ScannerConfig;
use scanwerk_image::{ImageLoader, downsample_factor};
use scanwerk_core::config::SampleRounding;
use scanwerk_core::types::ImageReference;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Decode a 2400x1800 PNG from disk into a 600x600-bounded raster.
///
/// The photo is a flat grey field with a darker band, so the encoded file
/// stays small and the measurement is dominated by the decode and reduction.
fn bench_decode_bounded(c: &mut Criterion) {
    let (width, height) = (2400u32, 1800u32);
    let mut img = GrayImage::from_pixel(width, height, Luma([200u8]));
    for y in 800..1000 {
        for x in 0..width {
            img.put_pixel(x, y, Luma([40u8]));
        }
    }
    let mut encoded = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
        .expect("encode bench image");

    let dir = tempfile::tempdir().expect("bench tempdir");
    let path = dir.path().join("picture.png");
    std::fs::write(&path, encoded).expect("write bench image");

    let loader = ImageLoader::from_config(&ScannerConfig::default());
    let reference = ImageReference::from_path(&path);

    c.bench_function("decode_bounded (2400x1800 -> 600)", |b| {
        b.iter(|| {
            let raster = loader.load(black_box(&reference)).expect("decode");
            black_box(raster.into_dynamic());
        });
    });
}

fn bench_downsample_factor(c: &mut Criterion) {
    c.bench_function("downsample_factor", |b| {
        b.iter(|| {
            black_box(downsample_factor(
                black_box(4032),
                black_box(3024),
                600,
                600,
                SampleRounding::PowerOfTwo,
            ))
        });
    });
}

criterion_group!(benches, bench_decode_bounded, bench_downsample_factor);
criterion_main!(benches);
