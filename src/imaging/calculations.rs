//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the largest size that fits within `max_edge` on the longer edge,
/// preserving aspect ratio.
///
/// Images that already fit are returned unchanged (never upscaled). The
/// shorter edge never rounds below 1 pixel.
///
/// # Examples
/// ```
/// # use rasterkit::imaging::fit_within_dimensions;
/// // 4000x3000 landscape bounded to 800 → 800x600
/// assert_eq!(fit_within_dimensions((4000, 3000), 800), (800, 600));
///
/// // already small enough → unchanged
/// assert_eq!(fit_within_dimensions((640, 480), 800), (640, 480));
/// ```
pub fn fit_within_dimensions(original: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);

    if max_edge == 0 || longer_edge <= max_edge {
        return original;
    }

    if orig_w >= orig_h {
        // Landscape or square
        let ratio = max_edge as f64 / orig_w as f64;
        (max_edge, ((orig_h as f64 * ratio).round() as u32).max(1))
    } else {
        // Portrait
        let ratio = max_edge as f64 / orig_h as f64;
        (((orig_w as f64 * ratio).round() as u32).max(1), max_edge)
    }
}
