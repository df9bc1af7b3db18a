//! Pure Rust imaging backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality honored, alpha dropped) |
//! | Encode → PNG / TIFF / WebP | `image` lossless encoders |
//! | Encode indexed → PNG | `png::Encoder` with `ColorType::Indexed` + PLTE |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Resize | `DynamicImage::resize_exact` with `CatmullRom` (bicubic) |
//! | Mode conversion | `DynamicImage::to_luma8` / `to_rgb8` / `to_rgba8` |

use super::backend::{BackendError, ImagingBackend};
use super::params::{OutputFormat, Quality};
use crate::palette::IndexedImage;
use crate::raster::{PixelMode, RasterBuffer};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use std::io::Cursor;

/// AVIF encoder speed (rav1e: 1 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn indexed_unsupported(op: &str) -> BackendError {
    BackendError::UnsupportedMode(format!(
        "{op} needs a direct-color buffer; expand {} through its color table first",
        PixelMode::Indexed8
    ))
}

/// Wrap a buffer's samples in the matching `image` container.
fn to_dynamic(image: &RasterBuffer) -> Result<DynamicImage, BackendError> {
    let (w, h) = image.dimensions();
    let data = image.as_raw().to_vec();
    let dynamic = match image.mode() {
        PixelMode::Gray8 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
        PixelMode::Rgb24 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        PixelMode::Rgba32 => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        PixelMode::Indexed8 => return Err(indexed_unsupported("conversion")),
    };
    dynamic.ok_or_else(|| {
        BackendError::UnsupportedMode(format!("{w}x{h} {} buffer rejected", image.mode()))
    })
}

/// Normalize any decoded image to one of the 8-bit direct-color modes.
///
/// 16-bit and float images are narrowed; gray+alpha widens to RGBA.
fn from_dynamic(img: DynamicImage) -> Result<RasterBuffer, BackendError> {
    let color = img.color();
    let (w, h) = (img.width(), img.height());
    let buffer = if color.has_alpha() {
        RasterBuffer::from_raw(w, h, PixelMode::Rgba32, img.into_rgba8().into_raw())?
    } else if !color.has_color() {
        RasterBuffer::from_raw(w, h, PixelMode::Gray8, img.into_luma8().into_raw())?
    } else {
        RasterBuffer::from_raw(w, h, PixelMode::Rgb24, img.into_rgb8().into_raw())?
    };
    Ok(buffer)
}

fn encode_dynamic(
    img: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    let q = quality.value() as u8;
    let mut cursor = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Jpeg => {
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, q))
        }
        OutputFormat::Png => img.write_with_encoder(PngEncoder::new(&mut cursor)),
        OutputFormat::Tiff => img.write_with_encoder(TiffEncoder::new(&mut cursor)),
        OutputFormat::WebP => img.write_with_encoder(WebPEncoder::new_lossless(&mut cursor)),
        OutputFormat::Avif => img.write_with_encoder(AvifEncoder::new_with_speed_quality(
            &mut cursor,
            AVIF_SPEED,
            q,
        )),
    };
    result.map_err(|e| BackendError::Encode(format!("{format}: {e}")))?;
    Ok(cursor.into_inner())
}

/// Write a palette PNG: 8-bit indices plus a PLTE chunk from the table.
fn encode_png_indexed(image: &IndexedImage) -> Result<Vec<u8>, BackendError> {
    let (w, h) = image.dimensions();
    let palette: Vec<u8> = image.table().colors().iter().flatten().copied().collect();
    let encode_err = |e: png::EncodingError| BackendError::Encode(format!("indexed PNG: {e}"));

    let mut bytes = Vec::new();
    let mut encoder = png::Encoder::new(&mut bytes, w, h);
    encoder.set_color(png::ColorType::Indexed);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_palette(palette);
    let mut writer = encoder.write_header().map_err(encode_err)?;
    writer
        .write_image_data(image.indices().as_raw())
        .map_err(encode_err)?;
    writer.finish().map_err(encode_err)?;
    Ok(bytes)
}

impl ImagingBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<RasterBuffer, BackendError> {
        let img = image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))?;
        from_dynamic(img)
    }

    fn encode(
        &self,
        image: &RasterBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let mut dynamic = to_dynamic(image)?;
        if image.mode().has_alpha() && !format.supports_alpha() {
            tracing::debug!(%format, "dropping alpha channel for encode");
            dynamic = DynamicImage::ImageRgb8(dynamic.to_rgb8());
        }
        if format == OutputFormat::Avif && image.mode() == PixelMode::Gray8 {
            dynamic = DynamicImage::ImageRgb8(dynamic.to_rgb8());
        }
        encode_dynamic(&dynamic, format, quality)
    }

    fn resize(
        &self,
        image: &RasterBuffer,
        width: u32,
        height: u32,
    ) -> Result<RasterBuffer, BackendError> {
        if width == 0 || height == 0 {
            return Err(crate::raster::RasterError::InvalidDimensions { width, height }.into());
        }
        if image.dimensions() == (width, height) {
            return Ok(image.clone());
        }
        let resized = to_dynamic(image)?.resize_exact(width, height, FilterType::CatmullRom);
        let (w, h) = (resized.width(), resized.height());
        let data = match image.mode() {
            PixelMode::Gray8 => resized.into_luma8().into_raw(),
            PixelMode::Rgb24 => resized.into_rgb8().into_raw(),
            _ => resized.into_rgba8().into_raw(),
        };
        Ok(RasterBuffer::from_raw(w, h, image.mode(), data)?)
    }

    fn convert_mode(
        &self,
        image: &RasterBuffer,
        mode: PixelMode,
    ) -> Result<RasterBuffer, BackendError> {
        if mode == PixelMode::Indexed8 {
            return Err(BackendError::UnsupportedMode(
                "palette conversion goes through palette::quantize".into(),
            ));
        }
        if image.mode() == mode {
            return Ok(image.clone());
        }
        let dynamic = to_dynamic(image)?;
        let (w, h) = image.dimensions();
        let data = match mode {
            PixelMode::Gray8 => dynamic.to_luma8().into_raw(),
            PixelMode::Rgb24 => dynamic.to_rgb8().into_raw(),
            _ => dynamic.to_rgba8().into_raw(),
        };
        Ok(RasterBuffer::from_raw(w, h, mode, data)?)
    }

    fn encode_indexed(
        &self,
        image: &IndexedImage,
        format: OutputFormat,
    ) -> Result<Vec<u8>, BackendError> {
        if format == OutputFormat::Png {
            return encode_png_indexed(image);
        }
        tracing::debug!(%format, "no palette support, expanding to RGB");
        self.encode(&image.to_rgb()?, format, Quality::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{ColorTable, build_palette_image};
    use crate::raster::Pixel;
    use crate::test_helpers::{assert_close, assert_pixel, solid_rgba};

    fn checker(w: u32, h: u32) -> RasterBuffer {
        RasterBuffer::from_fn(w, h, PixelMode::Rgb24, |x, y| {
            Pixel::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        })
        .unwrap()
    }

    #[test]
    fn png_roundtrip_is_lossless() {
        let backend = RustBackend::new();
        let original = checker(40, 30);
        let bytes = backend
            .encode(&original, OutputFormat::Png, Quality::default())
            .unwrap();
        let decoded = backend.decode(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn png_keeps_alpha_and_gray_modes() {
        let backend = RustBackend::new();
        let rgba =
            RasterBuffer::new(3, 3, PixelMode::Rgba32, Pixel::Rgba([10, 20, 30, 40])).unwrap();
        let bytes = backend
            .encode(&rgba, OutputFormat::Png, Quality::default())
            .unwrap();
        assert_eq!(backend.decode(&bytes).unwrap(), rgba);

        let gray = RasterBuffer::new(3, 3, PixelMode::Gray8, Pixel::Gray(77)).unwrap();
        let bytes = backend
            .encode(&gray, OutputFormat::Png, Quality::default())
            .unwrap();
        assert_eq!(backend.decode(&bytes).unwrap(), gray);
    }

    #[test]
    fn jpeg_drops_alpha() {
        let backend = RustBackend::new();
        let rgba = solid_rgba(16, 16, [200, 10, 10, 128]);
        let bytes = backend
            .encode(&rgba, OutputFormat::Jpeg, Quality::new(80))
            .unwrap();
        let decoded = backend.decode(&bytes).unwrap();
        assert_eq!(decoded.mode(), PixelMode::Rgb24);
        assert_eq!(decoded.dimensions(), (16, 16));
    }

    #[test]
    fn jpeg_quality_changes_size() {
        let backend = RustBackend::new();
        let image = checker(128, 128);
        let low = backend
            .encode(&image, OutputFormat::Jpeg, Quality::new(10))
            .unwrap();
        let high = backend
            .encode(&image, OutputFormat::Jpeg, Quality::new(95))
            .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn decode_garbage_fails() {
        let backend = RustBackend::new();
        let result = backend.decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn resize_exact_dimensions_and_mode() {
        let backend = RustBackend::new();
        let image = checker(64, 48);
        let resized = backend.resize(&image, 20, 10).unwrap();
        assert_eq!(resized.dimensions(), (20, 10));
        assert_eq!(resized.mode(), PixelMode::Rgb24);
    }

    #[test]
    fn resize_to_zero_fails() {
        let backend = RustBackend::new();
        assert!(backend.resize(&checker(4, 4), 0, 4).is_err());
    }

    #[test]
    fn convert_rgb_to_gray_and_rgba() {
        let backend = RustBackend::new();
        let white = RasterBuffer::new(2, 2, PixelMode::Rgb24, Pixel::Rgb([255, 255, 255])).unwrap();

        let gray = backend.convert_mode(&white, PixelMode::Gray8).unwrap();
        assert_pixel(&gray, 1, 1, Pixel::Gray(255));

        let rgba = backend.convert_mode(&white, PixelMode::Rgba32).unwrap();
        assert_pixel(&rgba, 0, 0, Pixel::Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn resize_of_uniform_image_stays_uniform() {
        let backend = RustBackend::new();
        let resized = backend.resize(&solid_rgba(30, 20, [40, 80, 120, 200]), 12, 9).unwrap();
        assert_close(&resized, &solid_rgba(12, 9, [40, 80, 120, 200]), 1);
    }

    #[test]
    fn indexed_buffers_are_rejected() {
        let backend = RustBackend::new();
        let indexed = RasterBuffer::new(2, 2, PixelMode::Indexed8, Pixel::Index(1)).unwrap();
        assert!(matches!(
            backend.encode(&indexed, OutputFormat::Png, Quality::default()),
            Err(BackendError::UnsupportedMode(_))
        ));
        assert!(matches!(
            backend.convert_mode(&checker(2, 2), PixelMode::Indexed8),
            Err(BackendError::UnsupportedMode(_))
        ));
    }

    /// Header color type and PLTE bytes of a PNG, read with the `png` decoder.
    fn png_header(bytes: &[u8]) -> (png::ColorType, Option<Vec<u8>>) {
        let reader = png::Decoder::new(bytes).read_info().unwrap();
        let info = reader.info();
        (info.color_type, info.palette.as_ref().map(|p| p.to_vec()))
    }

    #[test]
    fn indexed_png_keeps_palette() {
        let backend = RustBackend::new();
        let table = ColorTable::new(vec![[255, 0, 0], [0, 0, 255], [9, 9, 9]]).unwrap();
        let indices =
            RasterBuffer::from_fn(3, 2, PixelMode::Indexed8, |x, _| Pixel::Index(x as u8)).unwrap();
        let image = IndexedImage::new(indices, table).unwrap();

        let bytes = backend.encode_indexed(&image, OutputFormat::Png).unwrap();
        let (color_type, palette) = png_header(&bytes);
        assert_eq!(color_type, png::ColorType::Indexed);
        assert_eq!(palette, Some(vec![255, 0, 0, 0, 0, 255, 9, 9, 9]));

        // The image crate expands palette PNGs on decode.
        assert_eq!(backend.decode(&bytes).unwrap(), image.to_rgb().unwrap());
    }

    #[test]
    fn indexed_to_jpeg_expands_through_table() {
        let backend = RustBackend::new();
        let image = build_palette_image(16, 4).unwrap();
        let bytes = backend.encode_indexed(&image, OutputFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = backend.decode(&bytes).unwrap();
        assert_eq!(decoded.mode(), PixelMode::Rgb24);
        assert_eq!(decoded.dimensions(), (16, 4));
    }

    #[test]
    fn tiff_and_webp_encode() {
        let backend = RustBackend::new();
        let image = checker(8, 8);
        for format in [OutputFormat::Tiff, OutputFormat::WebP] {
            let bytes = backend.encode(&image, format, Quality::default()).unwrap();
            let decoded = backend.decode(&bytes).unwrap();
            assert_eq!(decoded.dimensions(), (8, 8), "{format}");
        }
    }
}
