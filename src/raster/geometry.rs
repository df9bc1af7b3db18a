use super::RasterError;

/// Half-open integer box `[x0, x1) × [y0, y1)`.
///
/// Always non-empty: construction rejects `x0 >= x1` or `y0 >= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Rect {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Result<Self, RasterError> {
        if x0 >= x1 || y0 >= y1 {
            return Err(RasterError::InvalidDimensions {
                width: x1.saturating_sub(x0),
                height: y1.saturating_sub(y0),
            });
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Box of `width × height` with its top-left corner at `(x, y)`.
    pub fn from_origin_size(x: u32, y: u32, width: u32, height: u32) -> Result<Self, RasterError> {
        let x1 = x.checked_add(width);
        let y1 = y.checked_add(height);
        match (x1, y1) {
            (Some(x1), Some(y1)) => Self::new(x, y, x1, y1),
            _ => Err(RasterError::GeometryMismatch(format!(
                "{width}x{height} at ({x}, {y}) overflows the coordinate space"
            ))),
        }
    }

    /// `[0, width) × [0, height)`; callers guarantee non-zero extents.
    pub(crate) fn covering(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    pub fn x0(&self) -> u32 {
        self.x0
    }

    pub fn y0(&self) -> u32 {
        self.y0
    }

    pub fn x1(&self) -> u32 {
        self.x1
    }

    pub fn y1(&self) -> u32 {
        self.y1
    }

    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.y0 >= self.y0 && other.x1 <= self.x1 && other.y1 <= self.y1
    }
}
