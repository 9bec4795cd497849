use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::canvas::mapper::CoordinateMapper;
use crate::canvas::model::{LogicalPoint, Rgb};
use crate::canvas::render::DamageRect;
use crate::canvas::slots::{SameIdentity, SlotInsert, SlotTable};
use crate::canvas::surface::{Rgba, RgbaBuffer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteState {
    pub position: LogicalPoint,
    /// Radians, zero along +x, counter-clockwise positive.
    pub heading: f64,
    /// Side of the square icon, in pixels.
    pub size: u32,
    pub color: Rgb,
    pub visible: bool,
}

/// Shared, externally mutated turtle sprite. Clones refer to the same sprite;
/// identity is by allocation, not by value.
#[derive(Debug, Clone)]
pub struct SpriteHandle(Arc<Mutex<SpriteState>>);

impl SpriteHandle {
    pub fn new(size: u32, color: Rgb) -> Self {
        Self(Arc::new(Mutex::new(SpriteState {
            position: LogicalPoint::ORIGIN,
            heading: std::f64::consts::FRAC_PI_2,
            size: size.max(1),
            color,
            visible: true,
        })))
    }

    fn lock(&self) -> MutexGuard<'_, SpriteState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> SpriteState {
        *self.lock()
    }

    pub fn set_position(&self, position: LogicalPoint) {
        self.lock().position = position;
    }

    pub fn set_heading(&self, heading: f64) {
        self.lock().heading = heading;
    }

    pub fn set_color(&self, color: Rgb) {
        self.lock().color = color;
    }

    pub fn set_visible(&self, visible: bool) {
        self.lock().visible = visible;
    }
}

impl SameIdentity for SpriteHandle {
    fn same_identity(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// What was last put on screen for one slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteFrame {
    /// Viewport rectangle covered by the icon.
    pub rect: DamageRect,
    pub heading: f64,
    pub color: Rgb,
}

impl SpriteFrame {
    pub fn for_state(state: &SpriteState, mapper: &CoordinateMapper) -> Self {
        let (cx, cy) = mapper.logical_to_viewport(state.position);
        let size = state.size as i32;
        Self {
            rect: DamageRect::new(cx - size / 2, cy - size / 2, size, size),
            heading: state.heading,
            color: state.color,
        }
    }
}

/// Renders the turtle icon: a triangle pointing along the heading on a
/// transparent square.
pub fn render_icon(state: &SpriteState) -> RgbaBuffer {
    let size = state.size.max(1);
    let mut icon = RgbaBuffer::new(size, size, Rgba::TRANSPARENT);
    let c = (size as f32 - 1.0) * 0.5;
    let r = c.max(0.5);
    let heading = state.heading as f32;
    let corner = |angle: f32, scale: f32| (c + r * scale * angle.cos(), c - r * scale * angle.sin());
    let tip = corner(heading, 1.0);
    let left = corner(heading + 2.5, 0.85);
    let right = corner(heading - 2.5, 0.85);
    let fill = Rgba::opaque(state.color);

    for y in 0..size as i32 {
        for x in 0..size as i32 {
            if in_triangle((x as f32, y as f32), tip, left, right) {
                icon.set_pixel(x, y, fill);
            }
        }
    }
    icon
}

fn in_triangle(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let edge = |u: (f32, f32), v: (f32, f32)| (v.0 - u.0) * (p.1 - u.1) - (v.1 - u.1) * (p.0 - u.0);
    let d1 = edge(a, b);
    let d2 = edge(b, c);
    let d3 = edge(c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Fixed slot table of sprites plus the frame each slot last drew.
#[derive(Debug)]
pub struct SpriteCompositor {
    slots: SlotTable<SpriteHandle>,
    drawn: Vec<Option<SpriteFrame>>,
    erase: Vec<bool>,
}

impl SpriteCompositor {
    pub fn new(max_sprites: usize) -> Self {
        Self {
            slots: SlotTable::new(max_sprites),
            drawn: vec![None; max_sprites],
            erase: vec![false; max_sprites],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, sprite: &SpriteHandle) -> bool {
        self.slots.position(sprite).is_some()
    }

    pub fn slot_of(&self, sprite: &SpriteHandle) -> Option<usize> {
        self.slots.position(sprite)
    }

    pub fn add(&mut self, sprite: SpriteHandle) -> bool {
        match self.slots.insert(sprite) {
            SlotInsert::Inserted(slot) => {
                tracing::debug!(slot, "sprite added");
                true
            }
            SlotInsert::AlreadyPresent(_) => false,
            SlotInsert::Full => {
                tracing::error!(max = self.capacity(), "no free sprite slot");
                false
            }
        }
    }

    pub fn remove(&mut self, sprite: &SpriteHandle) -> bool {
        if self.slots.remove(sprite).is_some() {
            return true;
        }
        tracing::error!("removing a sprite that was never added");
        false
    }

    pub fn last_drawn(&self, slot: usize) -> Option<SpriteFrame> {
        self.drawn.get(slot).copied().flatten()
    }

    /// Forgets every last-drawn frame after the whole viewport was repainted.
    pub fn invalidate_all(&mut self) {
        self.drawn.iter_mut().for_each(|frame| *frame = None);
        self.erase.iter_mut().for_each(|flag| *flag = false);
    }

    fn current_frame(&self, slot: usize, mapper: &CoordinateMapper) -> Option<SpriteFrame> {
        let state = self.slots.get(slot)?.state();
        state
            .visible
            .then(|| SpriteFrame::for_state(&state, mapper))
    }

    /// Decides which slots must be erased this cycle. A slot is erased when
    /// its sprite moved, turned, recolored or vanished, or when pixels under
    /// its last frame were overwritten by `overwritten` or by another slot
    /// being erased or redrawn.
    pub fn plan_erase(&mut self, mapper: &CoordinateMapper, overwritten: &[DamageRect]) {
        let current: Vec<Option<SpriteFrame>> = (0..self.capacity())
            .map(|slot| self.current_frame(slot, mapper))
            .collect();
        let mut touched: Vec<DamageRect> = overwritten.to_vec();

        for slot in 0..self.capacity() {
            self.erase[slot] = match self.drawn[slot] {
                Some(drawn) => {
                    let stale = current[slot] != Some(drawn)
                        || touched.iter().any(|rect| rect.intersects(&drawn.rect));
                    if stale {
                        touched.push(drawn.rect);
                    }
                    stale
                }
                None => false,
            };
            if self.erase[slot] || self.drawn[slot].is_none() {
                if let Some(next) = current[slot] {
                    touched.push(next.rect);
                }
            }
        }

        loop {
            let mut grew = false;
            for slot in 0..self.capacity() {
                let Some(drawn) = self.drawn[slot] else {
                    continue;
                };
                if self.erase[slot] || !touched.iter().any(|rect| rect.intersects(&drawn.rect)) {
                    continue;
                }
                self.erase[slot] = true;
                touched.push(drawn.rect);
                grew = true;
            }
            if !grew {
                break;
            }
        }
    }

    /// Viewport rect to restore for `slot`, if the plan erases it.
    pub fn erase_rect(&self, slot: usize) -> Option<DamageRect> {
        if !self.erase.get(slot).copied().unwrap_or(false) {
            return None;
        }
        self.last_drawn(slot).map(|frame| frame.rect)
    }

    pub fn mark_erased(&mut self, slot: usize) {
        if let Some(frame) = self.drawn.get_mut(slot) {
            *frame = None;
        }
        if let Some(flag) = self.erase.get_mut(slot) {
            *flag = false;
        }
    }

    /// Frame and icon for a slot that needs drawing, reading the sprite's
    /// state now.
    pub fn pending_draw(
        &self,
        slot: usize,
        mapper: &CoordinateMapper,
    ) -> Option<(SpriteFrame, RgbaBuffer)> {
        if self.last_drawn(slot).is_some() {
            return None;
        }
        let state = self.slots.get(slot)?.state();
        if !state.visible {
            return None;
        }
        Some((SpriteFrame::for_state(&state, mapper), render_icon(&state)))
    }

    pub fn mark_drawn(&mut self, slot: usize, frame: SpriteFrame) {
        if let Some(entry) = self.drawn.get_mut(slot) {
            *entry = Some(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new((1601, 1201), (700, 400))
    }

    fn draw_all(compositor: &mut SpriteCompositor) {
        let m = mapper();
        for slot in 0..compositor.capacity() {
            if let Some((frame, _)) = compositor.pending_draw(slot, &m) {
                compositor.mark_drawn(slot, frame);
            }
        }
    }

    #[test]
    fn frame_is_centered_on_the_sprite() {
        let sprite = SpriteHandle::new(11, Rgb::BLACK);
        let frame = SpriteFrame::for_state(&sprite.state(), &mapper());
        assert_eq!(frame.rect, DamageRect::new(345, 195, 11, 11));
    }

    #[test]
    fn icon_has_opaque_center_and_transparent_corners() {
        let sprite = SpriteHandle::new(15, Rgb::new(0, 128, 0));
        let icon = render_icon(&sprite.state());
        assert_eq!(icon.pixel(7, 7).map(|px| px.a), Some(255));
        assert_eq!(icon.pixel(0, 14).map(|px| px.a), Some(0));
        assert_eq!(icon.pixel(7, 1).map(|px| px.a), Some(255));
    }

    #[test]
    fn add_rejects_duplicates_and_overflow() {
        let mut compositor = SpriteCompositor::new(2);
        let a = SpriteHandle::new(5, Rgb::BLACK);
        assert!(compositor.add(a.clone()));
        assert!(!compositor.add(a.clone()));
        assert!(compositor.add(SpriteHandle::new(5, Rgb::BLACK)));
        assert!(!compositor.add(SpriteHandle::new(5, Rgb::BLACK)));
        assert_eq!(compositor.len(), 2);
        assert!(compositor.remove(&a));
        assert!(!compositor.remove(&a));
    }

    #[test]
    fn unchanged_sprites_are_not_erased() {
        let mut compositor = SpriteCompositor::new(3);
        let still = SpriteHandle::new(5, Rgb::BLACK);
        still.set_position(LogicalPoint::new(-100.0, 0.0));
        let moving = SpriteHandle::new(5, Rgb::BLACK);
        moving.set_position(LogicalPoint::new(100.0, 0.0));
        compositor.add(still.clone());
        compositor.add(moving.clone());
        draw_all(&mut compositor);

        moving.set_position(LogicalPoint::new(120.0, 0.0));
        compositor.plan_erase(&mapper(), &[]);
        assert_eq!(compositor.erase_rect(0), None);
        assert!(compositor.erase_rect(1).is_some());
    }

    #[test]
    fn overlap_with_a_redrawn_sprite_forces_erase() {
        let mut compositor = SpriteCompositor::new(2);
        let a = SpriteHandle::new(9, Rgb::BLACK);
        let b = SpriteHandle::new(9, Rgb::BLACK);
        b.set_position(LogicalPoint::new(30.0, 0.0));
        compositor.add(a.clone());
        compositor.add(b.clone());
        draw_all(&mut compositor);

        b.set_position(LogicalPoint::new(3.0, 0.0));
        compositor.plan_erase(&mapper(), &[]);
        assert!(compositor.erase_rect(0).is_some());
        assert!(compositor.erase_rect(1).is_some());
    }

    #[test]
    fn damage_over_a_sprite_forces_erase() {
        let mut compositor = SpriteCompositor::new(1);
        let a = SpriteHandle::new(9, Rgb::BLACK);
        compositor.add(a);
        draw_all(&mut compositor);

        compositor.plan_erase(&mapper(), &[DamageRect::new(340, 190, 20, 20)]);
        assert!(compositor.erase_rect(0).is_some());
    }

    #[test]
    fn removed_sprite_leaves_a_frame_to_erase() {
        let mut compositor = SpriteCompositor::new(1);
        let a = SpriteHandle::new(9, Rgb::BLACK);
        compositor.add(a.clone());
        draw_all(&mut compositor);
        compositor.remove(&a);

        compositor.plan_erase(&mapper(), &[]);
        let rect = compositor.erase_rect(0).expect("erase");
        compositor.mark_erased(0);
        assert_eq!(compositor.last_drawn(0), None);
        assert_eq!(rect.width, 9);
        assert!(compositor.pending_draw(0, &mapper()).is_none());
    }
}
