use crate::canvas::model::Rgb;
use crate::canvas::render::{DamageRect, Raster};

/// Whether a blit finished transferring its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlitStatus {
    Complete,
    /// The transfer is still in flight; the caller must come back later and
    /// issue the same blit again.
    Pending,
}

/// The on-screen viewport. All rectangles are in viewport pixels.
pub trait Surface {
    fn size(&self) -> (u32, u32);

    fn fill(&mut self, color: Rgb, clip: DamageRect) -> BlitStatus;

    /// Copies raster pixels inside `clip`, where viewport `(0, 0)` shows
    /// raster pixel `inset`.
    fn blit_raster(&mut self, raster: &Raster, inset: (i32, i32), clip: DamageRect) -> BlitStatus;

    /// Alpha-blends `image` with its top-left corner at `at`, limited to
    /// `clip`.
    fn blit_image(&mut self, image: &RgbaBuffer, at: (i32, i32), clip: DamageRect) -> BlitStatus;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub fn opaque(color: Rgb) -> Self {
        Self {
            r: color.r,
            g: color.g,
            b: color.b,
            a: 255,
        }
    }

    pub fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Source-over: `self` painted on top of `below`. Channel weights are
    /// kept in integer units of 255².
    pub fn over(self, below: Rgba) -> Rgba {
        let top_weight = u32::from(self.a) * 255;
        let below_weight = u32::from(below.a) * (255 - u32::from(self.a));
        let total = top_weight + below_weight;
        if total == 0 {
            return Rgba::TRANSPARENT;
        }
        let mix = |top: u8, under: u8| {
            let sum = u32::from(top) * top_weight + u32::from(under) * below_weight;
            ((sum + total / 2) / total).min(255) as u8
        };
        Rgba {
            r: mix(self.r, below.r),
            g: mix(self.g, below.g),
            b: mix(self.b, below.b),
            a: ((total + 127) / 255).min(255) as u8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaBuffer {
    pub fn new(width: u32, height: u32, fill: Rgba) -> Self {
        let mut pixels = vec![0u8; (width as usize) * (height as usize) * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[fill.r, fill.g, fill.b, fill.a]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(((y as u32 * self.width + x as u32) * 4) as usize)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let idx = self.index(x, y)?;
        Some(Rgba {
            r: self.pixels[idx],
            g: self.pixels[idx + 1],
            b: self.pixels[idx + 2],
            a: self.pixels[idx + 3],
        })
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }
}

/// In-memory viewport that completes every blit synchronously and counts
/// the pixels it writes.
#[derive(Debug, Clone)]
pub struct FrameSurface {
    frame: RgbaBuffer,
    pixel_writes: u64,
    blits: u64,
}

impl FrameSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: RgbaBuffer::new(width, height, Rgba::TRANSPARENT),
            pixel_writes: 0,
            blits: 0,
        }
    }

    /// Reallocates the frame; contents are lost until the next refresh.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.frame.width != width || self.frame.height != height {
            self.frame = RgbaBuffer::new(width, height, Rgba::TRANSPARENT);
        }
    }

    pub fn frame(&self) -> &RgbaBuffer {
        &self.frame
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        self.frame.pixel(x, y).map(Rgba::rgb)
    }

    pub fn pixel_writes(&self) -> u64 {
        self.pixel_writes
    }

    pub fn blits(&self) -> u64 {
        self.blits
    }

    fn crop(&self, clip: DamageRect) -> Option<DamageRect> {
        clip.clamp(self.frame.width, self.frame.height)
    }
}

impl Surface for FrameSurface {
    fn size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn fill(&mut self, color: Rgb, clip: DamageRect) -> BlitStatus {
        self.blits += 1;
        let Some(rect) = self.crop(clip) else {
            return BlitStatus::Complete;
        };
        let px = Rgba::opaque(color);
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.frame.set_pixel(x, y, px);
            }
        }
        self.pixel_writes += rect.area();
        BlitStatus::Complete
    }

    fn blit_raster(&mut self, raster: &Raster, inset: (i32, i32), clip: DamageRect) -> BlitStatus {
        self.blits += 1;
        let Some(rect) = self.crop(clip) else {
            return BlitStatus::Complete;
        };
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if let Some(src) = raster.pixel(x + inset.0, y + inset.1) {
                    self.frame.set_pixel(x, y, Rgba::opaque(src));
                    self.pixel_writes += 1;
                }
            }
        }
        BlitStatus::Complete
    }

    fn blit_image(&mut self, image: &RgbaBuffer, at: (i32, i32), clip: DamageRect) -> BlitStatus {
        self.blits += 1;
        let Some(rect) = self.crop(clip) else {
            return BlitStatus::Complete;
        };
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                let Some(top) = image.pixel(x - at.0, y - at.1) else {
                    continue;
                };
                if top.a == 0 {
                    continue;
                }
                let bottom = self.frame.pixel(x, y).unwrap_or(Rgba::TRANSPARENT);
                self.frame.set_pixel(x, y, top.over(bottom));
                self.pixel_writes += 1;
            }
        }
        BlitStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_over_opaque_mixes_channels() {
        let below = Rgba {
            r: 100,
            g: 100,
            b: 100,
            a: 255,
        };
        let top = Rgba {
            r: 200,
            g: 0,
            b: 0,
            a: 128,
        };
        assert_eq!(
            top.over(below),
            Rgba {
                r: 150,
                g: 50,
                b: 50,
                a: 255
            }
        );
        assert_eq!(Rgba::TRANSPARENT.over(below), below);
        assert_eq!(below.over(top), below);
        assert_eq!(Rgba::TRANSPARENT.over(Rgba::TRANSPARENT), Rgba::TRANSPARENT);
    }

    #[test]
    fn raster_blit_honours_inset_and_clip() {
        let mut raster = Raster::new(9, 9, Rgb::WHITE);
        raster.set_pixel(4, 4, Rgb::BLACK);
        let mut surface = FrameSurface::new(3, 3);
        surface.blit_raster(&raster, (3, 3), DamageRect::new(0, 0, 3, 3));
        assert_eq!(surface.pixel(1, 1), Some(Rgb::BLACK));
        assert_eq!(surface.pixel(0, 0), Some(Rgb::WHITE));
        assert_eq!(surface.pixel_writes(), 9);

        surface.blit_raster(&raster, (3, 3), DamageRect::new(2, 2, 5, 5));
        assert_eq!(surface.pixel_writes(), 10);
    }

    #[test]
    fn image_blit_skips_transparent_pixels() {
        let mut surface = FrameSurface::new(4, 4);
        surface.fill(Rgb::WHITE, DamageRect::new(0, 0, 4, 4));
        let mut icon = RgbaBuffer::new(2, 2, Rgba::TRANSPARENT);
        icon.set_pixel(0, 0, Rgba::opaque(Rgb::BLACK));
        surface.blit_image(&icon, (1, 1), DamageRect::new(1, 1, 2, 2));
        assert_eq!(surface.pixel(1, 1), Some(Rgb::BLACK));
        assert_eq!(surface.pixel(2, 2), Some(Rgb::WHITE));
        assert_eq!(surface.pixel_writes(), 17);
    }
}
