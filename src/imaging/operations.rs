//! High-level image operations.
//!
//! These functions combine calculations with backend execution and own the
//! small amount of file I/O the CLI needs outside the batch transcoder.

use super::backend::{BackendError, ImagingBackend};
use super::calculations::fit_within_dimensions;
use super::params::{OutputFormat, Quality};
use crate::palette::IndexedImage;
use crate::raster::RasterBuffer;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Resolve the output format from a path's extension.
pub fn format_for_path(path: &Path) -> Result<OutputFormat> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    OutputFormat::from_extension(ext)
        .ok_or_else(|| BackendError::Encode(format!("Unsupported output format: {ext:?}")))
}

/// Read and decode an image file.
pub fn load_image(backend: &impl ImagingBackend, path: &Path) -> Result<RasterBuffer> {
    let bytes = std::fs::read(path)?;
    backend.decode(&bytes).map_err(|e| match e {
        BackendError::Decode(msg) => {
            BackendError::Decode(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Encode an image in the format implied by `path` and write it.
pub fn save_image(
    backend: &impl ImagingBackend,
    image: &RasterBuffer,
    path: &Path,
    quality: Quality,
) -> Result<()> {
    let format = format_for_path(path)?;
    let bytes = backend.encode(image, format, quality)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Encode an indexed image (palette PNG when `path` ends in `.png`) and
/// write it.
pub fn save_indexed(
    backend: &impl ImagingBackend,
    image: &IndexedImage,
    path: &Path,
) -> Result<()> {
    let format = format_for_path(path)?;
    let bytes = backend.encode_indexed(image, format)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Downscale so the longer edge is at most `max_edge`; smaller images are
/// returned as-is.
pub fn fit_within(
    backend: &impl ImagingBackend,
    image: &RasterBuffer,
    max_edge: u32,
) -> Result<RasterBuffer> {
    let (w, h) = fit_within_dimensions(image.dimensions(), max_edge);
    if (w, h) == image.dimensions() {
        return Ok(image.clone());
    }
    backend.resize(image, w, h)
}

/// Resize to exactly `dimensions`, skipping the backend when already there.
pub fn resize_to(
    backend: &impl ImagingBackend,
    image: &RasterBuffer,
    dimensions: (u32, u32),
) -> Result<RasterBuffer> {
    if image.dimensions() == dimensions {
        return Ok(image.clone());
    }
    backend.resize(image, dimensions.0, dimensions.1)
}
