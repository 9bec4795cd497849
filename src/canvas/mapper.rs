use crate::canvas::model::LogicalPoint;
use crate::canvas::render::DamageRect;

/// Largest raster coordinate magnitude `to_raster` produces.
pub const RASTER_COORD_LIMIT: i32 = 1 << 28;

pub fn round_to_pixel(value: f64) -> i32 {
    let limit = f64::from(RASTER_COORD_LIMIT);
    value.round().clamp(-limit, limit) as i32
}

/// Converts between turtle space, raster pixels and viewport pixels.
///
/// The raster is centered behind the viewport, so the two pixel spaces only
/// differ by a constant inset. Both integer halves are computed with integer
/// division; with an odd raster size the logical origin lands on
/// `viewport / 2` for any viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMapper {
    raster: (u32, u32),
    viewport: (u32, u32),
}

impl CoordinateMapper {
    pub fn new(raster: (u32, u32), viewport: (u32, u32)) -> Self {
        Self {
            raster,
            viewport: (viewport.0.min(raster.0), viewport.1.min(raster.1)),
        }
    }

    pub fn raster_size(&self) -> (u32, u32) {
        self.raster
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    /// Unrounded raster position of `point`.
    pub fn raster_position(&self, point: LogicalPoint) -> (f64, f64) {
        let half_w = (self.raster.0 / 2) as f64;
        let half_h = (self.raster.1 / 2) as f64;
        (point.x + half_w, half_h - point.y)
    }

    /// Rounds after offsetting so every caller lands on the same pixel for
    /// the same logical point. Far-away points are pinned to
    /// `±RASTER_COORD_LIMIT` so later pixel arithmetic cannot overflow.
    pub fn to_raster(&self, point: LogicalPoint) -> (i32, i32) {
        let (x, y) = self.raster_position(point);
        (round_to_pixel(x), round_to_pixel(y))
    }

    /// Offset of the viewport's top-left corner inside the raster.
    pub fn inset(&self) -> (i32, i32) {
        (
            ((self.raster.0 - self.viewport.0) / 2) as i32,
            ((self.raster.1 - self.viewport.1) / 2) as i32,
        )
    }

    pub fn to_viewport(&self, raster_x: i32, raster_y: i32) -> (i32, i32) {
        let (ix, iy) = self.inset();
        (raster_x - ix, raster_y - iy)
    }

    pub fn logical_to_viewport(&self, point: LogicalPoint) -> (i32, i32) {
        let (x, y) = self.to_raster(point);
        self.to_viewport(x, y)
    }

    /// Viewport pixel back to whole turtle-space units.
    pub fn viewport_to_logical(&self, x: i32, y: i32) -> (i32, i32) {
        (
            x - (self.viewport.0 / 2) as i32,
            (self.viewport.1 / 2) as i32 - y,
        )
    }

    /// Translates a raster-space rect into the viewport, cropped to it.
    pub fn raster_rect_to_viewport(&self, rect: DamageRect) -> Option<DamageRect> {
        let (x, y) = self.to_viewport(rect.x, rect.y);
        DamageRect {
            x,
            y,
            width: rect.width,
            height: rect.height,
        }
        .clamp(self.viewport.0, self.viewport.1)
    }

    /// The viewport window, expressed in raster coordinates.
    pub fn visible_raster_window(&self) -> DamageRect {
        let (ix, iy) = self.inset();
        DamageRect {
            x: ix,
            y: iy,
            width: self.viewport.0 as i32,
            height: self.viewport.1 as i32,
        }
    }
}
