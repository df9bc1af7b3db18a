//! Palette (indexed-color) images.
//!
//! An [`IndexedImage`] keeps the two halves of a palette image apart: an
//! `Indexed8` [`RasterBuffer`] holding one table index per pixel, and the
//! [`ColorTable`] those indices point into. Swapping the table (for example
//! with [`IndexedImage::with_random_table`]) produces a new image with the
//! same spatial layout and different colors; the index buffer is never
//! shared mutably.
//!
//! ## Quantization pipeline
//!
//! ```text
//! source ─► posterize (optional) ─► median cut ─► nearest-color mapping
//!                                                      │
//!                                   random table (optional, seeded) ◄┘
//! ```
//!
//! Median cut repeatedly splits the box of histogram colors with the widest
//! channel range at its population-weighted median until the requested
//! number of boxes exists (or no box can be split). Each box contributes its
//! weighted mean color. Every pixel then gets the index of the nearest table
//! entry by squared Euclidean RGB distance, lowest index on ties. The whole
//! pipeline is deterministic; only the random-table variant consumes a seed.

use crate::raster::{Pixel, PixelMode, RasterBuffer, RasterError, Rgb};
use std::collections::{BTreeMap, HashMap};

/// The largest color table an `Indexed8` buffer can address.
pub const MAX_COLORS: usize = 256;

/// Ordered list of 1 to 256 RGB entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<Rgb>,
}

impl ColorTable {
    pub fn new(colors: Vec<Rgb>) -> Result<Self, RasterError> {
        if colors.is_empty() || colors.len() > MAX_COLORS {
            return Err(RasterError::InvalidColorCount(colors.len()));
        }
        Ok(Self { colors })
    }

    /// 256 shades of red: entry `i` is `(i, 0, 0)`.
    pub fn red_ramp() -> Self {
        Self {
            colors: (0..=255u8).map(|i| [i, 0, 0]).collect(),
        }
    }

    /// `len` colors drawn uniformly from the RGB cube.
    pub fn random(len: usize, seed: u64) -> Result<Self, RasterError> {
        let mut rng = SplitMix64::new(seed);
        let colors = (0..len)
            .map(|_| {
                let [r, g, b, ..] = rng.next_u64().to_le_bytes();
                [r, g, b]
            })
            .collect();
        Self::new(colors)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; tables hold at least one color.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.colors.get(usize::from(index)).copied()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Index of the entry closest to `color`; the lowest index wins ties.
    pub fn nearest(&self, color: Rgb) -> u8 {
        let mut best = 0usize;
        let mut best_dist = u32::MAX;
        for (i, entry) in self.colors.iter().enumerate() {
            let dist = distance_sq(*entry, color);
            if dist < best_dist {
                best = i;
                best_dist = dist;
                if dist == 0 {
                    break;
                }
            }
        }
        best as u8
    }
}

/// Squared Euclidean distance in RGB.
pub fn distance_sq(a: Rgb, b: Rgb) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = i32::from(x) - i32::from(y);
            (d * d) as u32
        })
        .sum()
}

/// An index buffer paired with the table its indices address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    indices: RasterBuffer,
    table: ColorTable,
}

impl IndexedImage {
    /// Pair an `Indexed8` buffer with a table, checking every index.
    pub fn new(indices: RasterBuffer, table: ColorTable) -> Result<Self, RasterError> {
        if indices.mode() != PixelMode::Indexed8 {
            return Err(RasterError::UnsupportedMode(format!(
                "index buffer must be {}, got {}",
                PixelMode::Indexed8,
                indices.mode()
            )));
        }
        if let Some(&index) = indices.as_raw().iter().max() {
            if usize::from(index) >= table.len() {
                return Err(RasterError::IndexOutOfRange {
                    index,
                    len: table.len(),
                });
            }
        }
        Ok(Self { indices, table })
    }

    pub fn indices(&self) -> &RasterBuffer {
        &self.indices
    }

    pub fn table(&self) -> &ColorTable {
        &self.table
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.indices.dimensions()
    }

    /// Same indices, different table.
    pub fn with_table(&self, table: ColorTable) -> Result<Self, RasterError> {
        Self::new(self.indices.clone(), table)
    }

    /// Same indices, a random table of the same length.
    pub fn with_random_table(&self, seed: u64) -> Result<Self, RasterError> {
        self.with_table(ColorTable::random(self.table.len(), seed)?)
    }

    /// Expand through the table into an RGB24 buffer (for encoding).
    pub fn to_rgb(&self) -> Result<RasterBuffer, RasterError> {
        let (w, h) = self.dimensions();
        let mut data = Vec::with_capacity(self.indices.as_raw().len() * 3);
        for &index in self.indices.as_raw() {
            let color = self.table.get(index).ok_or(RasterError::IndexOutOfRange {
                index,
                len: self.table.len(),
            })?;
            data.extend_from_slice(&color);
        }
        RasterBuffer::from_raw(w, h, PixelMode::Rgb24, data)
    }
}

/// Synthetic palette fixture: a [`ColorTable::red_ramp`] table and an index
/// buffer whose pixel at column `i` is index `i` on every row.
///
/// `width` must be 1..=256 so every column has its own table entry.
pub fn build_palette_image(width: u32, height: u32) -> Result<IndexedImage, RasterError> {
    if width == 0 || width as usize > MAX_COLORS {
        return Err(RasterError::InvalidDimensions { width, height });
    }
    let indices =
        RasterBuffer::from_fn(width, height, PixelMode::Indexed8, |x, _| Pixel::Index(x as u8))?;
    IndexedImage::new(indices, ColorTable::red_ramp())
}

/// Keep only the top `bits` bits of every color sample. Alpha is untouched.
pub fn posterize(source: &RasterBuffer, bits: u8) -> Result<RasterBuffer, RasterError> {
    if !(1..=8).contains(&bits) {
        return Err(RasterError::InvalidPosterizeBits(bits));
    }
    let mask = 0xFFu8 << (8 - bits);
    let data: Vec<u8> = match source.mode() {
        PixelMode::Gray8 | PixelMode::Rgb24 => source.as_raw().iter().map(|v| v & mask).collect(),
        PixelMode::Rgba32 => source
            .as_raw()
            .chunks_exact(4)
            .flat_map(|p| [p[0] & mask, p[1] & mask, p[2] & mask, p[3]])
            .collect(),
        PixelMode::Indexed8 => {
            return Err(RasterError::UnsupportedMode(
                "palette indices cannot be posterized".into(),
            ));
        }
    };
    RasterBuffer::from_raw(source.width(), source.height(), source.mode(), data)
}

/// Where the final color table comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteStrategy {
    /// Median-cut colors derived from the image.
    #[default]
    Adaptive,
    /// Median-cut index assignment, then the table is replaced by uniform
    /// random colors. Without a seed the output is valid but not
    /// reproducible.
    Random { seed: Option<u64> },
}

/// Options for [`quantize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizeOptions {
    /// Maximum table size, 1..=256.
    pub colors: usize,
    /// Posterize to this many bits per channel before palette selection.
    pub posterize_bits: Option<u8>,
    pub palette: PaletteStrategy,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            colors: MAX_COLORS,
            posterize_bits: None,
            palette: PaletteStrategy::Adaptive,
        }
    }
}

/// Reduce a Gray8, RGB24 or RGBA32 image (alpha ignored) to at most
/// `options.colors` colors.
pub fn quantize(
    source: &RasterBuffer,
    options: &QuantizeOptions,
) -> Result<IndexedImage, RasterError> {
    if options.colors == 0 || options.colors > MAX_COLORS {
        return Err(RasterError::InvalidColorCount(options.colors));
    }
    if source.mode() == PixelMode::Indexed8 {
        return Err(RasterError::UnsupportedMode(
            "source is already palette-indexed".into(),
        ));
    }

    let prepared = match options.posterize_bits {
        Some(bits) => posterize(source, bits)?,
        None => source.clone(),
    };
    let colors: Vec<Rgb> = prepared.pixels().map(rgb_of).collect();

    let mut histogram: BTreeMap<Rgb, u32> = BTreeMap::new();
    for &c in &colors {
        *histogram.entry(c).or_insert(0) += 1;
    }
    let table = ColorTable::new(median_cut(histogram.into_iter().collect(), options.colors))?;

    let mut lookup: HashMap<Rgb, u8> = HashMap::new();
    let index_data: Vec<u8> = colors
        .iter()
        .map(|&c| *lookup.entry(c).or_insert_with(|| table.nearest(c)))
        .collect();
    let indices = RasterBuffer::from_raw(
        source.width(),
        source.height(),
        PixelMode::Indexed8,
        index_data,
    )?;

    let table = match options.palette {
        PaletteStrategy::Adaptive => table,
        PaletteStrategy::Random { seed } => {
            ColorTable::random(options.colors, seed.unwrap_or_else(entropy_seed))?
        }
    };
    IndexedImage::new(indices, table)
}

fn rgb_of(pixel: Pixel) -> Rgb {
    match pixel {
        Pixel::Gray(g) | Pixel::Index(g) => [g, g, g],
        Pixel::Rgb(c) => c,
        Pixel::Rgba([r, g, b, _]) => [r, g, b],
    }
}

// ============================================================================
// Median cut
// ============================================================================

/// A set of distinct histogram colors with their pixel counts.
struct ColorBox {
    entries: Vec<(Rgb, u32)>,
}

impl ColorBox {
    fn population(&self) -> u64 {
        self.entries.iter().map(|&(_, n)| u64::from(n)).sum()
    }

    /// Channel with the largest value range, and that range.
    fn widest_channel(&self) -> (usize, u8) {
        let mut lo = [u8::MAX; 3];
        let mut hi = [u8::MIN; 3];
        for (c, _) in &self.entries {
            for ch in 0..3 {
                lo[ch] = lo[ch].min(c[ch]);
                hi[ch] = hi[ch].max(c[ch]);
            }
        }
        (0..3)
            .map(|ch| (ch, hi[ch] - lo[ch]))
            .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    fn mean(&self) -> Rgb {
        let total = self.population().max(1);
        let mut sums = [0u64; 3];
        for (c, n) in &self.entries {
            for ch in 0..3 {
                sums[ch] += u64::from(c[ch]) * u64::from(*n);
            }
        }
        sums.map(|s| ((s + total / 2) / total) as u8)
    }

    /// Split at the weighted median of the widest channel. Both halves are
    /// non-empty; callers only split boxes with at least two entries.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.entries.sort_by_key(|&(c, _)| (c[channel], c));

        let half = self.population().div_ceil(2);
        let mut running = 0u64;
        let mut cut = 1;
        for (i, &(_, n)) in self.entries.iter().enumerate() {
            running += u64::from(n);
            if running >= half {
                cut = i + 1;
                break;
            }
        }
        let cut = cut.clamp(1, self.entries.len() - 1);
        let upper = self.entries.split_off(cut);
        (self, ColorBox { entries: upper })
    }
}

/// Up to `max_colors` representative colors for a histogram.
fn median_cut(histogram: Vec<(Rgb, u32)>, max_colors: usize) -> Vec<Rgb> {
    let mut boxes = vec![ColorBox { entries: histogram }];
    while boxes.len() < max_colors {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.entries.len() > 1)
            .max_by_key(|(i, b)| (b.widest_channel().1, b.population(), std::cmp::Reverse(*i)))
            .map(|(i, _)| i);
        let Some(i) = candidate else { break };
        let (lower, upper) = boxes.remove(i).split();
        boxes.insert(i, upper);
        boxes.insert(i, lower);
    }
    boxes.iter().map(ColorBox::mean).collect()
}

// ============================================================================
// Seeded randomness
// ============================================================================

/// SplitMix64: tiny, fast, and identical on every platform for a given seed.
#[derive(Clone, Copy, Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

fn entropy_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::{gradient, gray_ramp};

    fn photo_like() -> RasterBuffer {
        RasterBuffer::from_fn(48, 32, PixelMode::Rgb24, |x, y| {
            Pixel::Rgb([(x * 5) as u8, (y * 7) as u8, ((x * y) % 256) as u8])
        })
        .unwrap()
    }

    fn assert_valid(img: &IndexedImage, max_colors: usize) {
        assert!(img.table().len() <= max_colors);
        assert_eq!(img.indices().mode(), PixelMode::Indexed8);
        for &i in img.indices().as_raw() {
            assert!((i as usize) < img.table().len());
        }
    }

    // =========================================================================
    // ColorTable
    // =========================================================================

    #[test]
    fn table_size_bounds() {
        assert!(ColorTable::new(vec![]).is_err());
        assert!(ColorTable::new(vec![[0, 0, 0]; 256]).is_ok());
        assert!(matches!(
            ColorTable::new(vec![[0, 0, 0]; 257]),
            Err(RasterError::InvalidColorCount(257))
        ));
    }

    #[test]
    fn nearest_prefers_lowest_index_on_ties() {
        let table = ColorTable::new(vec![[0, 0, 0], [10, 0, 0], [10, 0, 0]]).unwrap();
        assert_eq!(table.nearest([5, 0, 0]), 0);
        assert_eq!(table.nearest([9, 0, 0]), 1);
        assert_eq!(table.nearest([200, 200, 200]), 1);
    }

    #[test]
    fn random_table_is_seeded() {
        let a = ColorTable::random(16, 42).unwrap();
        let b = ColorTable::random(16, 42).unwrap();
        let c = ColorTable::random(16, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    // =========================================================================
    // Synthetic palette image
    // =========================================================================

    #[test]
    fn palette_image_red_ramp() {
        let img = build_palette_image(256, 1).unwrap();
        assert_eq!(img.table().len(), 256);
        assert_eq!(img.table().get(128), Some([128, 0, 0]));
        assert_eq!(img.indices().get(128, 0).unwrap(), Pixel::Index(128));
        assert_eq!(img.indices().get(0, 0).unwrap(), Pixel::Index(0));
        assert_eq!(img.indices().get(255, 0).unwrap(), Pixel::Index(255));
    }

    #[test]
    fn palette_image_expands_to_red_shades() {
        let rgb = build_palette_image(256, 2).unwrap().to_rgb().unwrap();
        assert_eq!(rgb.get(200, 1).unwrap(), Pixel::Rgb([200, 0, 0]));
    }

    #[test]
    fn palette_image_width_bounds() {
        assert!(build_palette_image(0, 1).is_err());
        assert!(build_palette_image(257, 1).is_err());
        assert!(build_palette_image(16, 0).is_err());
    }

    // =========================================================================
    // IndexedImage
    // =========================================================================

    #[test]
    fn indexed_image_rejects_dangling_indices() {
        let indices = RasterBuffer::new(2, 2, PixelMode::Indexed8, Pixel::Index(3)).unwrap();
        let table = ColorTable::new(vec![[0, 0, 0]; 3]).unwrap();
        assert!(matches!(
            IndexedImage::new(indices, table),
            Err(RasterError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn indexed_image_requires_indexed_mode() {
        let gray = RasterBuffer::new(2, 2, PixelMode::Gray8, Pixel::Gray(0)).unwrap();
        assert!(IndexedImage::new(gray, ColorTable::red_ramp()).is_err());
    }

    #[test]
    fn random_table_keeps_index_layout() {
        let img = quantize(&photo_like(), &QuantizeOptions::default()).unwrap();
        let swapped = img.with_random_table(7).unwrap();
        assert_eq!(swapped.indices(), img.indices());
        assert_eq!(swapped.table().len(), img.table().len());
        assert_ne!(swapped.table(), img.table());
    }

    // =========================================================================
    // Posterize
    // =========================================================================

    #[test]
    fn posterize_three_bits() {
        let src =
            RasterBuffer::new(1, 1, PixelMode::Rgba32, Pixel::Rgba([255, 100, 31, 77])).unwrap();
        let out = posterize(&src, 3).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), Pixel::Rgba([224, 96, 0, 77]));
    }

    #[test]
    fn posterize_eight_bits_is_identity() {
        let src = photo_like();
        assert_eq!(posterize(&src, 8).unwrap(), src);
    }

    #[test]
    fn posterize_bounds() {
        let src = photo_like();
        assert!(matches!(
            posterize(&src, 0),
            Err(RasterError::InvalidPosterizeBits(0))
        ));
        assert!(posterize(&src, 9).is_err());
    }

    // =========================================================================
    // Quantize
    // =========================================================================

    #[test]
    fn table_never_exceeds_color_count() {
        let src = photo_like();
        for colors in [1, 2, 3, 8, 16, 100, 256] {
            let img = quantize(
                &src,
                &QuantizeOptions {
                    colors,
                    ..Default::default()
                },
            )
            .unwrap();
            assert_valid(&img, colors);
        }
    }

    #[test]
    fn every_index_is_nearest_entry() {
        let src = photo_like();
        let img = quantize(
            &src,
            &QuantizeOptions {
                colors: 12,
                ..Default::default()
            },
        )
        .unwrap();
        for (pixel, &index) in src.pixels().zip(img.indices().as_raw()) {
            let c = rgb_of(pixel);
            let chosen = distance_sq(img.table().get(index).unwrap(), c);
            for entry in img.table().colors() {
                assert!(chosen <= distance_sq(*entry, c));
            }
        }
    }

    #[test]
    fn few_colors_are_reproduced_exactly() {
        let src = RasterBuffer::from_fn(4, 4, PixelMode::Rgb24, |x, _| {
            Pixel::Rgb(if x < 2 { [255, 0, 0] } else { [0, 0, 255] })
        })
        .unwrap();
        let img = quantize(&src, &QuantizeOptions::default()).unwrap();
        assert_eq!(img.table().len(), 2);
        assert_eq!(img.to_rgb().unwrap(), src);
    }

    #[test]
    fn grayscale_ramp_keeps_all_levels() {
        let img = quantize(&gray_ramp(256, 4).unwrap(), &QuantizeOptions::default()).unwrap();
        assert_eq!(img.table().len(), 256);
        let rgb = img.to_rgb().unwrap();
        assert_eq!(rgb.get(77, 3).unwrap(), Pixel::Rgb([77, 77, 77]));
    }

    #[test]
    fn seeded_random_quantize_is_bit_identical() {
        let src = gradient(32, 32, [0, 128, 255], [255, 255, 255]).unwrap();
        let options = QuantizeOptions {
            colors: 16,
            posterize_bits: Some(3),
            palette: PaletteStrategy::Random { seed: Some(42) },
        };
        let a = quantize(&src, &options).unwrap();
        let b = quantize(&src, &options).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.table().len(), 16);
        assert_valid(&a, 16);
    }

    #[test]
    fn random_variant_preserves_adaptive_indices() {
        let src = photo_like();
        let adaptive = quantize(
            &src,
            &QuantizeOptions {
                colors: 8,
                ..Default::default()
            },
        )
        .unwrap();
        let random = quantize(
            &src,
            &QuantizeOptions {
                colors: 8,
                palette: PaletteStrategy::Random { seed: Some(1) },
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(adaptive.indices(), random.indices());
    }

    #[test]
    fn unseeded_random_is_still_valid() {
        let img = quantize(
            &photo_like(),
            &QuantizeOptions {
                colors: 5,
                palette: PaletteStrategy::Random { seed: None },
                ..Default::default()
            },
        )
        .unwrap();
        assert_valid(&img, 5);
    }

    #[test]
    fn invalid_inputs_fail_fast() {
        let src = photo_like();
        for colors in [0, 257] {
            assert!(matches!(
                quantize(
                    &src,
                    &QuantizeOptions {
                        colors,
                        ..Default::default()
                    }
                ),
                Err(RasterError::InvalidColorCount(_))
            ));
        }
        let indexed = RasterBuffer::new(2, 2, PixelMode::Indexed8, Pixel::Index(0)).unwrap();
        assert!(matches!(
            quantize(&indexed, &QuantizeOptions::default()),
            Err(RasterError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn median_cut_splits_widest_channel() {
        let histogram = vec![([0, 0, 0], 1), ([0, 0, 10], 1), ([255, 0, 0], 1)];
        let mut colors = median_cut(histogram, 2);
        colors.sort();
        assert_eq!(colors, vec![[0, 0, 5], [255, 0, 0]]);
    }
}
