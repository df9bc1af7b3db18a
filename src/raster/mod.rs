//! In-memory pixel grids.
//!
//! Everything else in the crate produces or consumes a [`RasterBuffer`]:
//! the gradient synthesizer fills one, the compositor blends two of them,
//! the quantizer turns one into an index buffer plus color table, and the
//! imaging backend converts them to and from encoded bytes.
//!
//! The module is split into:
//! - **Pixel**: [`PixelMode`] (sample layout) and [`Pixel`] (one decoded value)
//! - **Geometry**: [`Rect`], the half-open box used for crops and pastes
//! - **Buffer**: [`RasterBuffer`] itself, with bounds-checked access,
//!   copy-out of sub-regions, and (optionally masked) paste

mod buffer;
mod geometry;
mod pixel;

pub use buffer::RasterBuffer;
pub use geometry::Rect;
pub use pixel::{Pixel, PixelMode, Rgb, parse_color};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("Pixel ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("Geometry mismatch: {0}")]
    GeometryMismatch(String),
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),
    #[error("Color count must be 1-256, got {0}")]
    InvalidColorCount(usize),
    #[error("Palette index {index} has no entry in a {len}-color table")]
    IndexOutOfRange { index: u8, len: usize },
    #[error("Posterize bits must be 1-8, got {0}")]
    InvalidPosterizeBits(u8),
    #[error("Buffer holds {actual} samples, {mode} {width}x{height} needs {expected}")]
    InvalidBuffer {
        width: u32,
        height: u32,
        mode: PixelMode,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}
