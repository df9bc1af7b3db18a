//! Shared test utilities for the rasterkit test suite.
//!
//! Writes real encoded fixtures with [`RustBackend`], plants corrupt files,
//! and provides pixel assertions with a clear message on mismatch.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_png(&tmp.path().join("a.png"), &checkerboard(8, 8));
//! write_corrupt(&tmp.path().join("b.png"));
//! ```

use std::path::Path;

use crate::imaging::{ImagingBackend, OutputFormat, Quality, RustBackend};
use crate::raster::{Pixel, PixelMode, RasterBuffer};

// =========================================================================
// Fixture images
// =========================================================================

/// Black/white RGB checkerboard with 1-pixel cells.
pub fn checkerboard(width: u32, height: u32) -> RasterBuffer {
    RasterBuffer::from_fn(width, height, PixelMode::Rgb24, |x, y| {
        let v = if (x + y) % 2 == 0 { 0 } else { 255 };
        Pixel::Rgb([v, v, v])
    })
    .unwrap()
}

/// Solid RGBA image.
pub fn solid_rgba(width: u32, height: u32, color: [u8; 4]) -> RasterBuffer {
    RasterBuffer::new(width, height, PixelMode::Rgba32, Pixel::Rgba(color)).unwrap()
}

// =========================================================================
// Fixture files
// =========================================================================

/// Encode `image` as PNG with the production backend and write it.
pub fn write_png(path: &Path, image: &RasterBuffer) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let bytes = RustBackend::new()
        .encode(image, OutputFormat::Png, Quality::default())
        .unwrap();
    std::fs::write(path, bytes).unwrap();
}

/// Write a file that starts like a PNG but is cut off mid-header.
pub fn write_corrupt(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR\x00\x00").unwrap();
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert the pixel at `(x, y)`. Panics with the coordinates on mismatch.
pub fn assert_pixel(image: &RasterBuffer, x: u32, y: u32, expected: Pixel) {
    let actual = image
        .get(x, y)
        .unwrap_or_else(|e| panic!("pixel ({x}, {y}) not readable: {e}"));
    assert_eq!(actual, expected, "pixel ({x}, {y}) mismatch");
}

/// Assert every sample of `a` is within `tolerance` of `b`.
pub fn assert_close(a: &RasterBuffer, b: &RasterBuffer, tolerance: u8) {
    assert_eq!(a.dimensions(), b.dimensions(), "dimensions differ");
    assert_eq!(a.mode(), b.mode(), "modes differ");
    for (i, (x, y)) in a.as_raw().iter().zip(b.as_raw()).enumerate() {
        assert!(
            x.abs_diff(*y) <= tolerance,
            "sample {i} differs: {x} vs {y} (tolerance {tolerance})"
        );
    }
}
