use crate::canvas::model::Rgb;

/// Axis-aligned pixel rectangle, half-open on the right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DamageRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds covering both points, grown by `lo`/`hi` on each axis.
    pub fn from_points(a: (i32, i32), b: (i32, i32), lo: i32, hi: i32) -> Self {
        let (lo, hi) = (i64::from(lo), i64::from(hi));
        let min_x = i64::from(a.0.min(b.0)) + lo;
        let max_x = i64::from(a.0.max(b.0)) + hi;
        let min_y = i64::from(a.1.min(b.1)) + lo;
        let max_y = i64::from(a.1.max(b.1)) + hi;
        Self::from_span(
            (min_x, min_y),
            (max_x.max(min_x) + 1, max_y.max(min_y) + 1),
        )
    }

    /// Half-open span `[min, max)` computed in wide arithmetic. Edges are
    /// pinned to half the `i32` range so the width always fits.
    pub fn from_span(min: (i64, i64), max: (i64, i64)) -> Self {
        let x = rect_edge(min.0);
        let y = rect_edge(min.1);
        Self {
            x,
            y,
            width: rect_edge(max.0).max(x) - x,
            height: rect_edge(max.1).max(y) - y,
        }
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width.max(0) as u64 * self.height.max(0) as u64
    }

    pub fn union(self, other: DamageRect) -> DamageRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());
        let mut rect = DamageRect::from_span(
            (i64::from(min_x), i64::from(min_y)),
            (i64::from(max_x), i64::from(max_y)),
        );
        rect.width = rect.width.max(1);
        rect.height = rect.height.max(1);
        rect
    }

    /// Union where either side may be absent.
    pub fn merge(acc: Option<DamageRect>, next: Option<DamageRect>) -> Option<DamageRect> {
        match (acc, next) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn intersect(self, other: DamageRect) -> Option<DamageRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DamageRect::from_span(
            (i64::from(x0), i64::from(y0)),
            (i64::from(x1), i64::from(y1)),
        ))
    }

    pub fn intersects(&self, other: &DamageRect) -> bool {
        self.intersect(*other).is_some()
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// Crops to `[0, width) x [0, height)`.
    pub fn clamp(self, width: u32, height: u32) -> Option<DamageRect> {
        self.intersect(DamageRect::new(0, 0, width as i32, height as i32))
    }
}

/// The persistent off-screen pixel buffer. Every pixel is opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, fill: Rgb) -> Self {
        let mut raster = Self {
            width,
            height,
            pixels: vec![0u8; (width as usize) * (height as usize) * 4],
        };
        raster.clear(fill);
        raster
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bounds(&self) -> DamageRect {
        DamageRect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn rgba_pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self, color: Rgb) {
        let px = color.to_rgba_array();
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(((y as u32 * self.width + x as u32) * 4) as usize)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        let idx = self.index(x, y)?;
        Some(Rgb::new(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
        ))
    }

    /// Writes one pixel; coordinates outside the raster are ignored.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        self.pixels[idx..idx + 4].copy_from_slice(&color.to_rgba_array());
        true
    }

    pub fn fill_rect(&mut self, rect: DamageRect, color: Rgb) -> Option<DamageRect> {
        let rect = rect.clamp(self.width, self.height)?;
        let px = color.to_rgba_array();
        for y in rect.y..rect.bottom() {
            let row = ((y as u32 * self.width) * 4) as usize;
            for x in rect.x..rect.right() {
                let idx = row + x as usize * 4;
                self.pixels[idx..idx + 4].copy_from_slice(&px);
            }
        }
        Some(rect)
    }

    /// Strokes a straight segment with a round brush `stroke_width` pixels
    /// across. Returns the stroke's bounds cropped to the raster.
    pub fn draw_segment(
        &mut self,
        start: (i32, i32),
        end: (i32, i32),
        stroke_width: u32,
        color: Rgb,
    ) -> Option<DamageRect> {
        let as_f64 = |p: (i32, i32)| (f64::from(p.0), f64::from(p.1));
        self.stroke_line(as_f64(start), as_f64(end), stroke_width, color)
    }

    /// Like [`Raster::draw_segment`] for unrounded raster positions. The
    /// segment is clipped to the raster grown by the brush width before it
    /// is walked, and the brush never grows past the raster's larger side.
    pub fn stroke_line(
        &mut self,
        start: (f64, f64),
        end: (f64, f64),
        stroke_width: u32,
        color: Rgb,
    ) -> Option<DamageRect> {
        let stroke_width = self.crop_stroke_width(stroke_width);
        let pad = f64::from(stroke_width);
        let (start, end) = clip_segment(
            start,
            end,
            (-pad, -pad),
            (
                f64::from(self.width) - 1.0 + pad,
                f64::from(self.height) - 1.0 + pad,
            ),
        )?;
        let start = (round_pixel(start.0), round_pixel(start.1));
        let end = (round_pixel(end.0), round_pixel(end.1));
        self.walk_segment(start, end, stroke_width, color)
    }

    pub fn crop_stroke_width(&self, stroke_width: u32) -> u32 {
        stroke_width.clamp(1, self.width.max(self.height).max(1))
    }

    // Endpoints lie within one brush width of the raster.
    fn walk_segment(
        &mut self,
        start: (i32, i32),
        end: (i32, i32),
        stroke_width: u32,
        color: Rgb,
    ) -> Option<DamageRect> {
        let mask = BrushMask::new(stroke_width);
        let bounds = stroke_bounds(start, end, stroke_width).clamp(self.width, self.height)?;

        let mut x0 = start.0;
        let mut y0 = start.1;
        let (x1, y1) = end;
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.stamp(&mask, (x0, y0), color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
        Some(bounds)
    }

    fn stamp(&mut self, mask: &BrushMask, center: (i32, i32), color: Rgb) {
        let px = color.to_rgba_array();
        for row in &mask.rows {
            let y = center.1 + row.dy;
            if y < 0 || y >= self.height as i32 {
                continue;
            }
            let x0 = (center.0 + row.min_dx).max(0);
            let x1 = (center.0 + row.max_dx).min(self.width as i32 - 1);
            if x0 > x1 {
                continue;
            }
            let row_base = ((y as u32 * self.width) * 4) as usize;
            for x in x0..=x1 {
                let idx = row_base + x as usize * 4;
                self.pixels[idx..idx + 4].copy_from_slice(&px);
            }
        }
    }

    /// 4-connected flood fill replacing the seed's color. Returns the bounds
    /// of the pixels that actually changed, or `None` when nothing did.
    pub fn flood_fill(&mut self, seed: (i32, i32), color: Rgb) -> Option<DamageRect> {
        let target = self.pixel(seed.0, seed.1)?;
        if target == color {
            return None;
        }

        let (mut min_x, mut min_y) = seed;
        let (mut max_x, mut max_y) = seed;
        let mut stack = vec![seed];
        while let Some((x, y)) = stack.pop() {
            if self.pixel(x, y) != Some(target) {
                continue;
            }
            self.set_pixel(x, y, color);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
            stack.push((x + 1, y));
            stack.push((x - 1, y));
            stack.push((x, y + 1));
            stack.push((x, y - 1));
        }

        Some(DamageRect::new(
            min_x,
            min_y,
            max_x - min_x + 1,
            max_y - min_y + 1,
        ))
    }
}

fn rect_edge(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN / 2), i64::from(i32::MAX / 2)) as i32
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn round_pixel(value: f64) -> i32 {
    saturate(value.round() as i64)
}

/// Liang-Barsky clip of segment `a`-`b` to the inclusive box `min`..`max`.
pub fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-dx, a.0 - min.0),
        (dx, max.0 - a.0),
        (-dy, a.1 - min.1),
        (dy, max.1 - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    let start = if t0 > 0.0 { (a.0 + t0 * dx, a.1 + t0 * dy) } else { a };
    let end = if t1 < 1.0 { (a.0 + t1 * dx, a.1 + t1 * dy) } else { b };
    Some((start, end))
}

/// Pixel offsets covered by a brush of the given width, relative to the
/// stamped point: `[lo, hi]` on both axes with `hi - lo + 1 == width`.
pub fn brush_extent(stroke_width: u32) -> (i32, i32) {
    let width = stroke_width.max(1) as i32;
    let lo = -(width / 2);
    (lo, lo + width - 1)
}

pub fn stroke_bounds(start: (i32, i32), end: (i32, i32), stroke_width: u32) -> DamageRect {
    let (lo, hi) = brush_extent(stroke_width);
    DamageRect::from_points(start, end, lo, hi)
}

struct BrushMask {
    rows: Vec<BrushMaskRow>,
}

struct BrushMaskRow {
    dy: i32,
    min_dx: i32,
    max_dx: i32,
}

impl BrushMask {
    fn new(stroke_width: u32) -> Self {
        let (lo, hi) = brush_extent(stroke_width);
        let center = (lo + hi) as f32 * 0.5;
        let radius_sq = (stroke_width as f32 * 0.5).powi(2);
        let mut rows = Vec::with_capacity(stroke_width as usize);
        for dy in lo..=hi {
            let ry = dy as f32 - center;
            let inside: Vec<i32> = (lo..=hi)
                .filter(|dx| {
                    let rx = *dx as f32 - center;
                    rx * rx + ry * ry <= radius_sq
                })
                .collect();
            if let (Some(&min_dx), Some(&max_dx)) = (inside.first(), inside.last()) {
                rows.push(BrushMaskRow { dy, min_dx, max_dx });
            }
        }
        Self { rows }
    }
}
