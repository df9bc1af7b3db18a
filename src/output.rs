//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output leads with what happened to each image; paths are shown by file
//! name where the directory is already known from context, and failures carry
//! their stage and message as an indented context line.
//!
//! # Output Format
//!
//! ## Batch
//!
//! ```text
//! Batch: 3 files
//!     a.png → a.jpg
//!     b.png: decode failed
//!         Decode error: corrupt header
//!     c.png → c.jpg
//! Converted 2 of 3 files, 1 failed
//!     b.png: decode failed
//! ```
//!
//! ## Single images
//!
//! ```text
//! gradient → out/logo.png (600x300 RGB24)
//! palette → palette_image.png (256x1, 256 colors)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::batch::{BatchEvent, BatchReport};
use crate::palette::IndexedImage;
use crate::raster::RasterBuffer;
use std::path::Path;

/// Display name for a path: its file name, or the whole path if it has none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => {
            let noun = if *total == 1 { "file" } else { "files" };
            vec![format!("Batch: {total} {noun}")]
        }
        BatchEvent::Converted { source, output } => vec![format!(
            "    {} \u{2192} {}",
            display_name(source),
            display_name(output)
        )],
        BatchEvent::Failed {
            source,
            kind,
            message,
        } => vec![
            format!("    {}: {kind} failed", display_name(source)),
            format!("        {message}"),
        ],
    }
}

/// Format the end-of-run summary, repeating every failure.
pub fn format_batch_report(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Converted {} of {} files, {} failed",
        report.succeeded, report.total, report.failed
    )];
    for failure in &report.failures {
        lines.push(format!(
            "    {}: {} failed",
            display_name(&failure.path),
            failure.kind
        ));
    }
    lines
}

/// Print one batch event to stdout.
pub fn print_batch_event(event: &BatchEvent) {
    for line in format_batch_event(event) {
        println!("{}", line);
    }
}

/// Print the batch summary to stdout.
pub fn print_batch_report(report: &BatchReport) {
    for line in format_batch_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Single images
// ============================================================================

/// `<label> → <path> (<w>x<h> <mode>)`
pub fn format_image_written(label: &str, path: &Path, image: &RasterBuffer) -> String {
    format!(
        "{label} \u{2192} {} ({}x{} {})",
        path.display(),
        image.width(),
        image.height(),
        image.mode()
    )
}

/// `<label> → <path> (<w>x<h>, <n> colors)`
pub fn format_indexed_written(label: &str, path: &Path, image: &IndexedImage) -> String {
    let (w, h) = image.dimensions();
    let n = image.table().len();
    let noun = if n == 1 { "color" } else { "colors" };
    format!("{label} \u{2192} {} ({w}x{h}, {n} {noun})", path.display())
}

pub fn print_image_written(label: &str, path: &Path, image: &RasterBuffer) {
    println!("{}", format_image_written(label, path, image));
}

pub fn print_indexed_written(label: &str, path: &Path, image: &IndexedImage) {
    println!("{}", format_indexed_written(label, path, image));
}
