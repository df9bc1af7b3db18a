use super::{Pixel, PixelMode, RasterError, Rect};

/// A decoded image: `width × height` pixels in one [`PixelMode`], stored
/// row-major from the top-left corner.
///
/// The sample vector always holds exactly `width * height * mode.channels()`
/// bytes; every constructor checks this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    mode: PixelMode,
    data: Vec<u8>,
}

fn check_dimensions(width: u32, height: u32) -> Result<(), RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }
    Ok(())
}

fn sample_len(width: u32, height: u32, mode: PixelMode) -> usize {
    width as usize * height as usize * mode.channels()
}

fn mode_mismatch(expected: PixelMode, found: PixelMode) -> RasterError {
    RasterError::UnsupportedMode(format!("expected a {expected} pixel, got {found}"))
}

impl RasterBuffer {
    /// Create a buffer filled with a single pixel value.
    pub fn new(width: u32, height: u32, mode: PixelMode, fill: Pixel) -> Result<Self, RasterError> {
        check_dimensions(width, height)?;
        if fill.mode() != mode {
            return Err(mode_mismatch(mode, fill.mode()));
        }
        let channels = mode.channels();
        let mut sample = [0u8; 4];
        fill.write_samples(&mut sample[..channels]);
        let data = sample[..channels].repeat(width as usize * height as usize);
        Ok(Self {
            width,
            height,
            mode,
            data,
        })
    }

    /// Wrap existing samples. Fails if the length does not match the geometry.
    pub fn from_raw(
        width: u32,
        height: u32,
        mode: PixelMode,
        data: Vec<u8>,
    ) -> Result<Self, RasterError> {
        check_dimensions(width, height)?;
        let expected = sample_len(width, height, mode);
        if data.len() != expected {
            return Err(RasterError::InvalidBuffer {
                width,
                height,
                mode,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            mode,
            data,
        })
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, mode: PixelMode, mut f: F) -> Result<Self, RasterError>
    where
        F: FnMut(u32, u32) -> Pixel,
    {
        check_dimensions(width, height)?;
        let channels = mode.channels();
        let mut data = vec![0u8; sample_len(width, height, mode)];
        let mut chunks = data.chunks_exact_mut(channels);
        for y in 0..height {
            for x in 0..width {
                let pixel = f(x, y);
                if pixel.mode() != mode {
                    return Err(mode_mismatch(mode, pixel.mode()));
                }
                if let Some(chunk) = chunks.next() {
                    pixel.write_samples(chunk);
                }
            }
        }
        Ok(Self {
            width,
            height,
            mode,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mode(&self) -> PixelMode {
        self.mode
    }

    /// The full extent of the buffer as a rect.
    pub fn bounds(&self) -> Rect {
        Rect::covering(self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Iterate over all pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        let mode = self.mode;
        self.data
            .chunks_exact(mode.channels())
            .map(move |s| Pixel::from_samples(mode, s))
    }

    fn offset(&self, x: u32, y: u32) -> Result<usize, RasterError> {
        if x >= self.width || y >= self.height {
            return Err(RasterError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok((y as usize * self.width as usize + x as usize) * self.mode.channels())
    }

    pub fn get(&self, x: u32, y: u32) -> Result<Pixel, RasterError> {
        let start = self.offset(x, y)?;
        let end = start + self.mode.channels();
        Ok(Pixel::from_samples(self.mode, &self.data[start..end]))
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<(), RasterError> {
        let start = self.offset(x, y)?;
        if pixel.mode() != self.mode {
            return Err(mode_mismatch(self.mode, pixel.mode()));
        }
        let end = start + self.mode.channels();
        pixel.write_samples(&mut self.data[start..end]);
        Ok(())
    }

    /// Copy the pixels inside `rect` into a new buffer.
    pub fn subregion(&self, rect: Rect) -> Result<RasterBuffer, RasterError> {
        if !self.bounds().contains(&rect) {
            return Err(RasterError::OutOfBounds {
                x: rect.x1() - 1,
                y: rect.y1() - 1,
                width: self.width,
                height: self.height,
            });
        }
        let channels = self.mode.channels();
        let row_len = rect.width() as usize * channels;
        let mut data = Vec::with_capacity(row_len * rect.height() as usize);
        for y in rect.y0()..rect.y1() {
            let start = (y as usize * self.width as usize + rect.x0() as usize) * channels;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        RasterBuffer::from_raw(rect.width(), rect.height(), self.mode, data)
    }

    /// Paste `source` with its top-left corner at `origin`.
    ///
    /// Without a mask, source samples replace destination samples. With a
    /// `Gray8` mask the size of `source`, every channel is blended as
    /// `dst * (1 - m/255) + src * (m/255)`.
    pub fn paste(
        &mut self,
        source: &RasterBuffer,
        origin: (u32, u32),
        mask: Option<&RasterBuffer>,
    ) -> Result<(), RasterError> {
        if source.mode != self.mode {
            return Err(RasterError::UnsupportedMode(format!(
                "cannot paste {} into {}",
                source.mode, self.mode
            )));
        }
        let target = Rect::from_origin_size(origin.0, origin.1, source.width, source.height)?;
        if !self.bounds().contains(&target) {
            return Err(RasterError::GeometryMismatch(format!(
                "{}x{} source at ({}, {}) does not fit in {}x{} destination",
                source.width, source.height, origin.0, origin.1, self.width, self.height
            )));
        }
        if let Some(mask) = mask {
            if mask.mode != PixelMode::Gray8 {
                return Err(RasterError::UnsupportedMode(format!(
                    "paste mask must be {}, got {}",
                    PixelMode::Gray8,
                    mask.mode
                )));
            }
            if mask.dimensions() != source.dimensions() {
                return Err(RasterError::GeometryMismatch(format!(
                    "mask is {}x{}, source is {}x{}",
                    mask.width, mask.height, source.width, source.height
                )));
            }
            if self.mode == PixelMode::Indexed8 {
                return Err(RasterError::UnsupportedMode(
                    "masked paste cannot blend palette indices".into(),
                ));
            }
        }

        let channels = self.mode.channels();
        let src_row_len = source.width as usize * channels;
        let dst_stride = self.width as usize * channels;
        for row in 0..source.height as usize {
            let dst_start = (origin.1 as usize + row) * dst_stride + origin.0 as usize * channels;
            let dst_row = &mut self.data[dst_start..dst_start + src_row_len];
            let src_row = &source.data[row * src_row_len..(row + 1) * src_row_len];

            match mask {
                None => dst_row.copy_from_slice(src_row),
                Some(mask) => {
                    let w = source.width as usize;
                    let mask_row = &mask.data[row * w..(row + 1) * w];
                    for ((dst, src), &m) in dst_row
                        .chunks_exact_mut(channels)
                        .zip(src_row.chunks_exact(channels))
                        .zip(mask_row)
                    {
                        for (d, &s) in dst.iter_mut().zip(src) {
                            *d = blend(*d, s, m);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// `dst * (255 - m) / 255 + src * m / 255`, rounded to nearest.
fn blend(dst: u8, src: u8, m: u8) -> u8 {
    let m = u32::from(m);
    ((u32::from(dst) * (255 - m) + u32::from(src) * m + 127) / 255) as u8
}
