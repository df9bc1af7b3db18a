//! Pixel modes and pixel values.

use super::RasterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An RGB triplet.
pub type Rgb = [u8; 3];

/// Sample layout of a [`RasterBuffer`](super::RasterBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelMode {
    /// One luminance sample per pixel.
    #[serde(rename = "gray")]
    Gray8,
    /// Red, green, blue.
    #[serde(rename = "rgb")]
    Rgb24,
    /// Red, green, blue, straight (non-premultiplied) alpha.
    #[serde(rename = "rgba")]
    Rgba32,
    /// One color-table index per pixel. The table itself lives in
    /// [`IndexedImage`](crate::palette::IndexedImage).
    #[serde(rename = "indexed")]
    Indexed8,
}

impl PixelMode {
    pub fn channels(self) -> usize {
        match self {
            PixelMode::Gray8 | PixelMode::Indexed8 => 1,
            PixelMode::Rgb24 => 3,
            PixelMode::Rgba32 => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == PixelMode::Rgba32
    }
}

impl fmt::Display for PixelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelMode::Gray8 => "Gray8",
            PixelMode::Rgb24 => "RGB24",
            PixelMode::Rgba32 => "RGBA32",
            PixelMode::Indexed8 => "Indexed8",
        };
        f.write_str(name)
    }
}

impl FromStr for PixelMode {
    type Err = RasterError;

    /// Accepts the config spelling (`gray`, `rgb`, `rgba`, `indexed`), the
    /// display names, and the single-letter aliases `L` and `P`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gray" | "gray8" | "l" => Ok(PixelMode::Gray8),
            "rgb" | "rgb24" => Ok(PixelMode::Rgb24),
            "rgba" | "rgba32" => Ok(PixelMode::Rgba32),
            "indexed" | "indexed8" | "p" => Ok(PixelMode::Indexed8),
            other => Err(RasterError::UnsupportedMode(format!(
                "unknown pixel mode '{other}'"
            ))),
        }
    }
}

/// A single pixel value. The variant always matches the mode of the buffer
/// it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {
    Gray(u8),
    Rgb(Rgb),
    Rgba([u8; 4]),
    Index(u8),
}

impl Pixel {
    pub fn mode(self) -> PixelMode {
        match self {
            Pixel::Gray(_) => PixelMode::Gray8,
            Pixel::Rgb(_) => PixelMode::Rgb24,
            Pixel::Rgba(_) => PixelMode::Rgba32,
            Pixel::Index(_) => PixelMode::Indexed8,
        }
    }

    /// Decode a pixel from exactly `mode.channels()` samples.
    pub(crate) fn from_samples(mode: PixelMode, samples: &[u8]) -> Self {
        match mode {
            PixelMode::Gray8 => Pixel::Gray(samples[0]),
            PixelMode::Indexed8 => Pixel::Index(samples[0]),
            PixelMode::Rgb24 => Pixel::Rgb([samples[0], samples[1], samples[2]]),
            PixelMode::Rgba32 => Pixel::Rgba([samples[0], samples[1], samples[2], samples[3]]),
        }
    }

    /// Write this pixel into exactly `self.mode().channels()` samples.
    pub(crate) fn write_samples(self, out: &mut [u8]) {
        match self {
            Pixel::Gray(v) | Pixel::Index(v) => out[0] = v,
            Pixel::Rgb(rgb) => out.copy_from_slice(&rgb),
            Pixel::Rgba(rgba) => out.copy_from_slice(&rgba),
        }
    }
}

/// Parse a color given as `#rrggbb`, `#rgb`, `r,g,b`, or one of a handful of
/// names (`black`, `white`, `red`, `green`, `blue`, `orange`, `gray`).
pub fn parse_color(input: &str) -> Result<Rgb, RasterError> {
    let s = input.trim();
    let invalid = || RasterError::InvalidColor(input.to_string());

    if let Some(hex) = s.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;
        return match digits.as_slice() {
            [r, g, b] => Ok([r * 17, g * 17, b * 17]),
            [r1, r0, g1, g0, b1, b0] => Ok([r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0]),
            _ => Err(invalid()),
        };
    }

    if s.contains(',') {
        let parts: Vec<u8> = s
            .split(',')
            .map(|p| p.trim().parse::<u8>().ok())
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;
        return match parts.as_slice() {
            [r, g, b] => Ok([*r, *g, *b]),
            _ => Err(invalid()),
        };
    }

    match s.to_ascii_lowercase().as_str() {
        "black" => Ok([0, 0, 0]),
        "white" => Ok([255, 255, 255]),
        "red" => Ok([255, 0, 0]),
        "green" => Ok([0, 128, 0]),
        "blue" => Ok([0, 0, 255]),
        "orange" => Ok([255, 165, 0]),
        "gray" | "grey" => Ok([128, 128, 128]),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_per_mode() {
        assert_eq!(PixelMode::Gray8.channels(), 1);
        assert_eq!(PixelMode::Rgb24.channels(), 3);
        assert_eq!(PixelMode::Rgba32.channels(), 4);
        assert_eq!(PixelMode::Indexed8.channels(), 1);
    }

    #[test]
    fn only_rgba_has_alpha() {
        assert!(PixelMode::Rgba32.has_alpha());
        assert!(!PixelMode::Rgb24.has_alpha());
        assert!(!PixelMode::Indexed8.has_alpha());
    }

    #[test]
    fn mode_from_str_aliases() {
        assert_eq!("L".parse::<PixelMode>().unwrap(), PixelMode::Gray8);
        assert_eq!("rgb".parse::<PixelMode>().unwrap(), PixelMode::Rgb24);
        assert_eq!("RGBA32".parse::<PixelMode>().unwrap(), PixelMode::Rgba32);
        assert_eq!("P".parse::<PixelMode>().unwrap(), PixelMode::Indexed8);
        assert!("cmyk".parse::<PixelMode>().is_err());
    }

    #[test]
    fn mode_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&PixelMode::Rgb24).unwrap();
        assert_eq!(json, "\"rgb\"");
        let mode: PixelMode = serde_json::from_str("\"gray\"").unwrap();
        assert_eq!(mode, PixelMode::Gray8);
    }

    #[test]
    fn pixel_sample_roundtrip_per_mode() {
        let mut buf = [0u8; 4];
        Pixel::Rgba([1, 2, 3, 4]).write_samples(&mut buf);
        assert_eq!(
            Pixel::from_samples(PixelMode::Rgba32, &buf),
            Pixel::Rgba([1, 2, 3, 4])
        );
        Pixel::Index(7).write_samples(&mut buf[..1]);
        assert_eq!(
            Pixel::from_samples(PixelMode::Indexed8, &buf[..1]),
            Pixel::Index(7)
        );
    }

    #[test]
    fn parse_color_hex_forms() {
        assert_eq!(parse_color("#0080ff").unwrap(), [0, 128, 255]);
        assert_eq!(parse_color("#FFF").unwrap(), [255, 255, 255]);
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gg0000").is_err());
    }

    #[test]
    fn parse_color_triplet_and_names() {
        assert_eq!(parse_color("10, 20,30").unwrap(), [10, 20, 30]);
        assert_eq!(parse_color("White").unwrap(), [255, 255, 255]);
        assert_eq!(parse_color("orange").unwrap(), [255, 165, 0]);
        assert!(parse_color("1,2").is_err());
        assert!(parse_color("300,0,0").is_err());
        assert!(matches!(
            parse_color("chartreuse"),
            Err(RasterError::InvalidColor(_))
        ));
    }
}
