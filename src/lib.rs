//! # rasterkit
//!
//! Raster synthesis and transcoding on in-memory pixel grids: two-color
//! gradients, alpha compositing, palette (indexed-color) images and median-cut
//! quantization, plus a batch pass that transcodes a directory of images and
//! keeps going when individual files are broken.
//!
//! # Architecture
//!
//! Every algorithm works on a [`raster::RasterBuffer`]; only the edges touch
//! encoded bytes or the filesystem:
//!
//! ```text
//!            ┌────────── imaging (decode / encode / resize / convert) ──────────┐
//! bytes ───► │ RasterBuffer ─► gradient · composite · palette ─► RasterBuffer   │ ───► bytes
//!            └──────────────────────────────────────────────────────────────────┘
//!                       batch = list files ─► the above per file, in parallel
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`raster`] | `RasterBuffer`, `Pixel`, `PixelMode`, `Rect`, masked paste |
//! | [`imaging`] | `ImagingBackend` trait at the `image` crate boundary, `RustBackend`, load/save helpers |
//! | [`gradient`] | Vertical two-color gradient through a grayscale mask; gray ramp fixture |
//! | [`composite`] | Straight-alpha "over" operator, backend-fitted compositing, vertical stacking |
//! | [`palette`] | `ColorTable`, `IndexedImage`, posterize, median-cut quantization, seeded random tables |
//! | [`batch`] | Directory transcoding with per-file failure recording and progress events |
//! | [`naming`] | File-name pattern matching and output name derivation |
//! | [`config`] | `config.toml` loading, stock defaults, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Backend Trait at the Library Boundary
//!
//! Decoding, encoding, resampling and mode conversion go through
//! [`imaging::ImagingBackend`]. [`imaging::RustBackend`] implements it with
//! the `image` crate; tests use a recording mock, so the batch driver and the
//! compositing helpers are exercised without real codecs.
//!
//! ## Integer Pixel Math
//!
//! Masked paste and compositing use `u32` products with one rounded division
//! by 255. Results are bit-identical across platforms and thread counts, and
//! the identities that matter hold exactly: a transparent overlay leaves the
//! background untouched, an opaque one replaces it.
//!
//! ## Per-File Failure in Batches
//!
//! A batch run returns an error only for problems with the job itself. A file
//! that cannot be read, decoded, transformed, encoded or written is recorded
//! in the [`batch::BatchReport`] and the rest of the directory is still
//! processed.

pub mod batch;
pub mod composite;
pub mod config;
pub mod gradient;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod palette;
pub mod raster;

#[cfg(test)]
pub(crate) mod test_helpers;
