//! Boundary to the external imaging library.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Encode** | `image` codecs (JPEG, PNG, TIFF, WebP, AVIF) |
//! | **Encode indexed** | `png` palette encoder (PNG), RGB expansion otherwise |
//! | **Resize** | `resize_exact` + `CatmullRom` |
//! | **Convert mode** | `DynamicImage` luma/rgb/rgba conversions |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: [`Quality`] and [`OutputFormat`]
//! - **Backend**: [`ImagingBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend + file I/O

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImagingBackend};
pub use calculations::fit_within_dimensions;
pub use operations::{
    fit_within, format_for_path, load_image, resize_to, save_image, save_indexed,
};
pub use params::{OutputFormat, Quality};
pub use rust_backend::RustBackend;
