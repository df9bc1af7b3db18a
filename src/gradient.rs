//! Gradient synthesis.
//!
//! A gradient is built the same way you would build one by hand with layers:
//! a solid start-color layer, a solid end-color layer, and a grayscale mask
//! that ramps from 0 at the top to 255 at the bottom. Pasting the end layer
//! onto the start layer through that mask gives a top-to-bottom linear blend.
//!
//! ```text
//! row 0      mask   0   → start color
//! row y      mask   floor(255·y/h)
//! row h-1    mask 255   → end color
//! ```

use crate::raster::{Pixel, PixelMode, RasterBuffer, RasterError, Rgb};

/// Mask value for row `y` of an `h`-row ramp.
///
/// `floor(255·y/h)`, except the last row of a multi-row ramp is pinned to
/// 255 so the end color is reached exactly. Non-decreasing in `y`.
pub fn ramp_value(y: u32, height: u32) -> u8 {
    if height > 1 && y + 1 == height {
        return 255;
    }
    (255 * u64::from(y) / u64::from(height)) as u8
}

/// Vertical two-color gradient, `start` at the top row and `end` at the bottom.
pub fn gradient(width: u32, height: u32, start: Rgb, end: Rgb) -> Result<RasterBuffer, RasterError> {
    let mut base = RasterBuffer::new(width, height, PixelMode::Rgb24, Pixel::Rgb(start))?;
    let top = RasterBuffer::new(width, height, PixelMode::Rgb24, Pixel::Rgb(end))?;
    let mask = RasterBuffer::from_fn(width, height, PixelMode::Gray8, |_, y| {
        Pixel::Gray(ramp_value(y, height))
    })?;
    base.paste(&top, (0, 0), Some(&mask))?;
    Ok(base)
}

/// Grayscale ramp whose value at column `x` is `x mod 256`.
///
/// Handy as a quantizer input: a 256-wide ramp holds every gray level once.
pub fn gray_ramp(width: u32, height: u32) -> Result<RasterBuffer, RasterError> {
    RasterBuffer::from_fn(width, height, PixelMode::Gray8, |x, _| {
        Pixel::Gray((x % 256) as u8)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_at(buf: &RasterBuffer, x: u32, y: u32) -> Rgb {
        match buf.get(x, y).unwrap() {
            Pixel::Rgb(c) => c,
            other => panic!("expected RGB pixel, got {other:?}"),
        }
    }

    fn close(a: Rgb, b: Rgb) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 1)
    }

    #[test]
    fn black_to_white_10x10() {
        let g = gradient(10, 10, [0, 0, 0], [255, 255, 255]).unwrap();
        assert!(close(rgb_at(&g, 5, 0), [0, 0, 0]));
        assert!(close(rgb_at(&g, 5, 9), [255, 255, 255]));
    }

    #[test]
    fn endpoints_match_for_many_sizes() {
        let a = [0, 128, 255];
        let b = [255, 255, 255];
        for (w, h) in [(1, 2), (3, 3), (7, 100), (600, 300), (2, 257)] {
            let g = gradient(w, h, a, b).unwrap();
            assert!(close(rgb_at(&g, 0, 0), a), "{w}x{h} top");
            assert!(close(rgb_at(&g, w - 1, h - 1), b), "{w}x{h} bottom");
        }
    }

    #[test]
    fn rows_are_uniform() {
        let g = gradient(5, 8, [10, 20, 30], [200, 100, 0]).unwrap();
        for y in 0..8 {
            let first = rgb_at(&g, 0, y);
            for x in 1..5 {
                assert_eq!(rgb_at(&g, x, y), first);
            }
        }
    }

    #[test]
    fn monotonic_per_component() {
        // rising red, falling green, flat blue
        let g = gradient(2, 64, [0, 255, 50], [255, 0, 50]).unwrap();
        for y in 0..63 {
            let cur = rgb_at(&g, 0, y);
            let next = rgb_at(&g, 0, y + 1);
            assert!(cur[0] <= next[0], "red decreased at row {y}");
            assert!(cur[1] >= next[1], "green increased at row {y}");
            assert_eq!(cur[2], next[2]);
        }
    }

    #[test]
    fn ramp_is_monotonic_and_pinned() {
        for h in [1u32, 2, 3, 10, 255, 256, 1000] {
            assert_eq!(ramp_value(0, h), 0);
            if h > 1 {
                assert_eq!(ramp_value(h - 1, h), 255);
            }
            for y in 0..h.saturating_sub(1) {
                assert!(ramp_value(y, h) <= ramp_value(y + 1, h));
            }
        }
    }

    #[test]
    fn single_row_is_start_color() {
        let g = gradient(4, 1, [9, 9, 9], [200, 200, 200]).unwrap();
        assert_eq!(rgb_at(&g, 3, 0), [9, 9, 9]);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(
            gradient(0, 10, [0, 0, 0], [1, 1, 1]),
            Err(RasterError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            gradient(10, 0, [0, 0, 0], [1, 1, 1]),
            Err(RasterError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn gray_ramp_wraps_at_256() {
        let r = gray_ramp(300, 2).unwrap();
        assert_eq!(r.get(0, 1).unwrap(), Pixel::Gray(0));
        assert_eq!(r.get(255, 0).unwrap(), Pixel::Gray(255));
        assert_eq!(r.get(256, 0).unwrap(), Pixel::Gray(0));
    }
}
