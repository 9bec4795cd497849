#![allow(dead_code)]

use std::collections::HashSet;

use turtle_canvas::canvas::render::{DamageRect, Raster};
use turtle_canvas::canvas::surface::RgbaBuffer;
use turtle_canvas::canvas::{BlitStatus, FrameSurface, Rgb, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Fill(DamageRect),
    Raster(DamageRect),
    Image(DamageRect),
}

/// Records every blit and can report chosen raster blits as still pending.
/// A pending blit leaves the frame untouched.
#[derive(Debug)]
pub struct ScriptedSurface {
    pub inner: FrameSurface,
    pub calls: Vec<Call>,
    raster_blits: usize,
    pending_raster: HashSet<usize>,
    pending_images: usize,
}

impl ScriptedSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: FrameSurface::new(width, height),
            calls: Vec::new(),
            raster_blits: 0,
            pending_raster: HashSet::new(),
            pending_images: 0,
        }
    }

    /// The `n`th raster blit from now (0-based) reports pending.
    pub fn pend_raster_blit(&mut self, n: usize) {
        self.pending_raster.insert(self.raster_blits + n);
    }

    /// The next `count` image blits report pending.
    pub fn pend_image_blits(&mut self, count: usize) {
        self.pending_images = count;
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        self.inner.pixel(x, y)
    }
}

impl Surface for ScriptedSurface {
    fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    fn fill(&mut self, color: Rgb, clip: DamageRect) -> BlitStatus {
        self.calls.push(Call::Fill(clip));
        self.inner.fill(color, clip)
    }

    fn blit_raster(&mut self, raster: &Raster, inset: (i32, i32), clip: DamageRect) -> BlitStatus {
        self.calls.push(Call::Raster(clip));
        let index = self.raster_blits;
        self.raster_blits += 1;
        if self.pending_raster.remove(&index) {
            return BlitStatus::Pending;
        }
        self.inner.blit_raster(raster, inset, clip)
    }

    fn blit_image(&mut self, image: &RgbaBuffer, at: (i32, i32), clip: DamageRect) -> BlitStatus {
        self.calls.push(Call::Image(clip));
        if self.pending_images > 0 {
            self.pending_images -= 1;
            return BlitStatus::Pending;
        }
        self.inner.blit_image(image, at, clip)
    }
}
