//! Imaging backend trait and shared types.
//!
//! The [`ImagingBackend`] trait is the boundary to the external imaging
//! library: everything that understands container formats or resamples
//! pixels sits behind it. The synthesis, compositing and quantization code
//! in this crate only ever calls these four operations.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the recording `MockBackend` in the `tests` submodule.

use super::params::{OutputFormat, Quality};
use crate::palette::IndexedImage;
use crate::raster::{PixelMode, RasterBuffer, RasterError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),
}

/// Trait for imaging backends.
///
/// Implementations must be `Sync`: the batch transcoder shares one backend
/// across rayon workers.
pub trait ImagingBackend: Sync {
    /// Decode an encoded image (any supported container) into a buffer.
    fn decode(&self, bytes: &[u8]) -> Result<RasterBuffer, BackendError>;

    /// Encode a buffer into the given container format.
    fn encode(
        &self,
        image: &RasterBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;

    /// Resample to exactly `width × height`, keeping the pixel mode.
    fn resize(
        &self,
        image: &RasterBuffer,
        width: u32,
        height: u32,
    ) -> Result<RasterBuffer, BackendError>;

    /// Convert between direct-color modes (`Gray8`, `Rgb24`, `Rgba32`).
    fn convert_mode(
        &self,
        image: &RasterBuffer,
        mode: PixelMode,
    ) -> Result<RasterBuffer, BackendError>;

    /// Encode an index buffer with its color table.
    ///
    /// Backends that cannot store a palette in `format` expand the image
    /// through its table and encode the RGB result.
    fn encode_indexed(
        &self,
        image: &IndexedImage,
        format: OutputFormat,
    ) -> Result<Vec<u8>, BackendError> {
        self.encode(&image.to_rgb()?, format, Quality::default())
    }
}
