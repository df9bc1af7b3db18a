//! Alpha compositing.
//!
//! [`composite`] applies the "over" operator with straight (non-premultiplied)
//! alpha, per channel:
//!
//! ```text
//! out_c = ov_c · a + bg_c · (1 − a)
//! out_a = a + bg_a · (1 − a)          where a = ov_a / 255
//! ```
//!
//! All arithmetic is done on `u32` products with a single rounded division
//! by 255, so a fully transparent overlay reproduces the background exactly
//! and a fully opaque one reproduces the overlay exactly.
//!
//! [`composite`] never resamples; [`composite_fitted`] is the driver-level
//! helper that brings the inputs into shape through the imaging backend
//! first.

use crate::imaging::{BackendError, ImagingBackend, resize_to};
use crate::raster::{Pixel, PixelMode, RasterBuffer, RasterError};

fn div255(x: u32) -> u32 {
    (x + 127) / 255
}

/// Blend one straight-alpha RGBA pixel over another.
pub fn over(bg: [u8; 4], ov: [u8; 4]) -> [u8; 4] {
    let a = u32::from(ov[3]);
    let inv = 255 - a;
    let mut out = [0u8; 4];
    for c in 0..3 {
        out[c] = div255(u32::from(ov[c]) * a + u32::from(bg[c]) * inv) as u8;
    }
    out[3] = (a + div255(u32::from(bg[3]) * inv)) as u8;
    out
}

/// Widen an RGB or RGBA buffer to RGBA with opaque alpha where missing.
pub fn to_rgba(image: &RasterBuffer) -> Result<RasterBuffer, RasterError> {
    match image.mode() {
        PixelMode::Rgba32 => Ok(image.clone()),
        PixelMode::Rgb24 => {
            let data = image
                .as_raw()
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect();
            RasterBuffer::from_raw(image.width(), image.height(), PixelMode::Rgba32, data)
        }
        other => Err(RasterError::UnsupportedMode(format!(
            "cannot composite onto a {other} background"
        ))),
    }
}

/// Composite `overlay` over `background`.
///
/// `background` may be RGB24 (treated as opaque) or RGBA32; `overlay` must
/// be RGBA32 with exactly the background's dimensions.
pub fn composite(
    background: &RasterBuffer,
    overlay: &RasterBuffer,
) -> Result<RasterBuffer, RasterError> {
    if overlay.mode() != PixelMode::Rgba32 {
        return Err(RasterError::UnsupportedMode(format!(
            "overlay must be {}, got {}",
            PixelMode::Rgba32,
            overlay.mode()
        )));
    }
    let out = to_rgba(background)?;
    if out.dimensions() != overlay.dimensions() {
        return Err(RasterError::GeometryMismatch(format!(
            "overlay is {}x{}, background is {}x{}",
            overlay.width(),
            overlay.height(),
            out.width(),
            out.height()
        )));
    }

    let blended: Vec<u8> = out
        .as_raw()
        .chunks_exact(4)
        .zip(overlay.as_raw().chunks_exact(4))
        .flat_map(|(bg, ov)| over([bg[0], bg[1], bg[2], bg[3]], [ov[0], ov[1], ov[2], ov[3]]))
        .collect();
    RasterBuffer::from_raw(out.width(), out.height(), PixelMode::Rgba32, blended)
}

/// Convert the background to RGBA and resize the overlay to match it
/// through `backend`, then [`composite`].
pub fn composite_fitted(
    backend: &impl ImagingBackend,
    background: &RasterBuffer,
    overlay: &RasterBuffer,
) -> Result<RasterBuffer, BackendError> {
    let background = match background.mode() {
        PixelMode::Rgb24 | PixelMode::Rgba32 => background.clone(),
        _ => backend.convert_mode(background, PixelMode::Rgba32)?,
    };
    let overlay = match overlay.mode() {
        PixelMode::Rgba32 => overlay.clone(),
        _ => backend.convert_mode(overlay, PixelMode::Rgba32)?,
    };
    let overlay = resize_to(backend, &overlay, background.dimensions())?;
    Ok(composite(&background, &overlay)?)
}

/// Stack images top to bottom on a black canvas as wide as the widest one.
///
/// All images must share one pixel mode.
pub fn stack_vertical(images: &[RasterBuffer]) -> Result<RasterBuffer, RasterError> {
    let first = images
        .first()
        .ok_or(RasterError::InvalidDimensions { width: 0, height: 0 })?;
    let mode = first.mode();
    if let Some(odd) = images.iter().find(|img| img.mode() != mode) {
        return Err(RasterError::UnsupportedMode(format!(
            "cannot stack {} with {}",
            odd.mode(),
            mode
        )));
    }

    let width = images.iter().map(|img| img.width()).max().unwrap_or(0);
    let height = images
        .iter()
        .try_fold(0u32, |acc, img| acc.checked_add(img.height()))
        .ok_or_else(|| RasterError::GeometryMismatch("stacked height overflows u32".into()))?;

    let fill = match mode {
        PixelMode::Gray8 => Pixel::Gray(0),
        PixelMode::Rgb24 => Pixel::Rgb([0, 0, 0]),
        PixelMode::Rgba32 => Pixel::Rgba([0, 0, 0, 255]),
        PixelMode::Indexed8 => Pixel::Index(0),
    };
    let mut canvas = RasterBuffer::new(width, height, mode, fill)?;
    let mut y = 0;
    for img in images {
        canvas.paste(img, (0, y), None)?;
        y += img.height();
    }
    Ok(canvas)
}
