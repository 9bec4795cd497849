use std::sync::Arc;
use std::time::Duration;

use crate::canvas::input::{InputRouter, KeyHandler, KeyInput, MouseButton, MouseHandler};
use crate::canvas::mapper::CoordinateMapper;
use crate::canvas::model::{FontSpec, LogicalPoint, Rgb};
use crate::canvas::ops::GraphicsOp;
use crate::canvas::queue::OperationQueue;
use crate::canvas::render::{DamageRect, Raster};
use crate::canvas::settings::{CanvasSettings, MINIMUM_HEIGHT, MINIMUM_WIDTH};
use crate::canvas::sprite::{SpriteCompositor, SpriteHandle};
use crate::canvas::state::{can_transition, PaintProgress, PaintState};
use crate::canvas::surface::{BlitStatus, Surface};
use crate::canvas::text::{BlockTextRenderer, TextRenderer};

/// Cloneable producer side of the canvas. Safe to use from any thread while
/// the owning [`TurtleCanvas`] paints.
#[derive(Debug, Clone)]
pub struct CanvasCommands {
    queue: Arc<OperationQueue>,
}

impl CanvasCommands {
    pub fn draw_line(&self, from: LogicalPoint, to: LogicalPoint, width: u32, color: Rgb) {
        self.queue.enqueue(GraphicsOp::Line {
            from,
            to,
            width,
            color,
        });
    }

    /// Draws `steps` along `heading` from `from` and returns the far end. A
    /// negative step count walks backwards.
    pub fn draw_line_steps(
        &self,
        from: LogicalPoint,
        steps: f64,
        heading: f64,
        width: u32,
        color: Rgb,
    ) -> LogicalPoint {
        let (heading, steps) = normalize_steps(heading, steps);
        let to = from.other_end_point(heading, steps);
        self.draw_line(from, to, width, color);
        to
    }

    pub fn fill(&self, seed: LogicalPoint, color: Rgb) {
        self.queue.enqueue(GraphicsOp::Fill { seed, color });
    }

    pub fn label(&self, text: impl Into<String>, anchor: LogicalPoint, font: FontSpec, color: Rgb) {
        self.queue.enqueue(GraphicsOp::Label {
            text: text.into(),
            anchor,
            font,
            color,
        });
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn wait_drained(&self, timeout: Duration) -> bool {
        self.queue.wait_drained(timeout)
    }
}

/// Turns a signed step count into a non-negative one, reversing the heading
/// for negative counts. Headings stay in `[0, 2π)` when given in range.
pub fn normalize_steps(heading: f64, steps: f64) -> (f64, f64) {
    if steps >= 0.0 {
        return (heading, steps);
    }
    let mut heading = heading - std::f64::consts::PI;
    if heading < 0.0 {
        heading += std::f64::consts::TAU;
    }
    (heading, -steps)
}

/// The deferred-rendering turtle canvas.
///
/// Drawing commands are queued and only reach the off-screen raster when
/// [`TurtleCanvas::paint`] drains them. `paint` then reconciles the viewport
/// in four phases: refresh the background, apply queued operations, erase
/// stale sprites, and draw the current sprites. A phase whose blit reports
/// [`BlitStatus::Pending`] suspends the cycle and the next call resumes
/// exactly where it stopped.
pub struct TurtleCanvas {
    raster_size: (u32, u32),
    viewport: (u32, u32),
    background: Rgb,
    queue: Arc<OperationQueue>,
    raster: Option<Raster>,
    text_renderer: Arc<dyn TextRenderer>,
    sprites: SpriteCompositor,
    input: InputRouter,
    paint_state: PaintState,
    sprite_cursor: usize,
    needs_refresh: bool,
    pending_damage: Option<DamageRect>,
    overwritten: Vec<DamageRect>,
}

impl std::fmt::Debug for TurtleCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurtleCanvas")
            .field("raster_size", &self.raster_size)
            .field("viewport", &self.viewport)
            .field("background", &self.background)
            .field("pending_ops", &self.queue.len())
            .field("raster_ready", &self.raster.is_some())
            .field("sprites", &self.sprites.len())
            .field("paint_state", &self.paint_state)
            .field("sprite_cursor", &self.sprite_cursor)
            .finish()
    }
}

impl Default for TurtleCanvas {
    fn default() -> Self {
        Self::new(CanvasSettings::default())
    }
}

impl TurtleCanvas {
    pub fn new(settings: CanvasSettings) -> Self {
        Self::with_text_renderer(settings, Arc::new(BlockTextRenderer))
    }

    pub fn with_text_renderer(
        mut settings: CanvasSettings,
        text_renderer: Arc<dyn TextRenderer>,
    ) -> Self {
        settings.sanitize();
        Self {
            raster_size: (settings.raster_width, settings.raster_height),
            viewport: (settings.viewport_width, settings.viewport_height),
            background: settings.background,
            queue: Arc::new(OperationQueue::new(
                settings.queue_initial_capacity,
                settings.queue_growth,
            )),
            raster: None,
            text_renderer,
            sprites: SpriteCompositor::new(settings.max_sprites),
            input: InputRouter::new(settings.max_key_handlers, settings.max_mouse_handlers),
            paint_state: PaintState::Refresh,
            sprite_cursor: 0,
            needs_refresh: true,
            pending_damage: None,
            overwritten: Vec::new(),
        }
    }

    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.raster_size, self.viewport)
    }

    pub fn commands(&self) -> CanvasCommands {
        CanvasCommands {
            queue: Arc::clone(&self.queue),
        }
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn paint_state(&self) -> PaintState {
        self.paint_state
    }

    pub fn sprite_cursor(&self) -> usize {
        self.sprite_cursor
    }

    pub fn sprites(&self) -> &SpriteCompositor {
        &self.sprites
    }

    pub fn input(&self) -> &InputRouter {
        &self.input
    }

    // Drawing commands, forwarded to the queue.

    pub fn draw_line(&self, from: LogicalPoint, to: LogicalPoint, width: u32, color: Rgb) {
        self.commands().draw_line(from, to, width, color);
    }

    pub fn draw_line_steps(
        &self,
        from: LogicalPoint,
        steps: f64,
        heading: f64,
        width: u32,
        color: Rgb,
    ) -> LogicalPoint {
        self.commands()
            .draw_line_steps(from, steps, heading, width, color)
    }

    pub fn fill(&self, seed: LogicalPoint, color: Rgb) {
        self.commands().fill(seed, color);
    }

    pub fn label(&self, text: impl Into<String>, anchor: LogicalPoint, font: FontSpec, color: Rgb) {
        self.commands().label(text, anchor, font, color);
    }

    // Sprites.

    pub fn add_sprite(&mut self, sprite: SpriteHandle) -> bool {
        self.sprites.add(sprite)
    }

    pub fn remove_sprite(&mut self, sprite: &SpriteHandle) -> bool {
        self.sprites.remove(sprite)
    }

    // Input fan-out.

    pub fn add_key_handler(&mut self, handler: Arc<dyn KeyHandler>) -> bool {
        self.input.add_key_handler(handler)
    }

    pub fn remove_key_handler(&mut self, handler: &Arc<dyn KeyHandler>) -> bool {
        self.input.remove_key_handler(handler)
    }

    pub fn add_mouse_handler(&mut self, handler: Arc<dyn MouseHandler>) -> bool {
        self.input.add_mouse_handler(handler)
    }

    pub fn remove_mouse_handler(&mut self, handler: &Arc<dyn MouseHandler>) -> bool {
        self.input.remove_mouse_handler(handler)
    }

    pub fn key_pressed(&self, key: KeyInput) {
        self.input.key_pressed(key);
    }

    /// `x`/`y` are viewport pixels.
    pub fn mouse_released(&mut self, x: i32, y: i32, button: MouseButton) {
        let at = self.mapper().viewport_to_logical(x, y);
        self.input.mouse_released(at, button);
    }

    pub fn mouse_moved(&mut self, x: i32, y: i32) {
        let at = self.mapper().viewport_to_logical(x, y);
        self.input.mouse_moved(at);
    }

    pub fn focus_gained(&mut self) {
        self.input.focus_gained();
    }

    pub fn focus_lost(&mut self) {
        self.input.focus_lost();
    }

    pub fn mouse_x(&self) -> i32 {
        self.input.mouse_position().0
    }

    pub fn mouse_y(&self) -> i32 {
        self.input.mouse_position().1
    }

    // Whole-canvas state changes.

    /// Drops pending drawing and wipes the raster; the next cycle repaints
    /// the whole viewport.
    pub fn clean(&mut self) {
        let discarded = self.queue.clear();
        if let Some(raster) = self.raster.as_mut() {
            raster.clear(self.background);
        }
        self.needs_refresh = true;
        self.pending_damage = None;
        tracing::debug!(discarded, "canvas cleaned");
    }

    /// Changes the background. Like [`TurtleCanvas::clean`], this discards
    /// all drawing.
    pub fn set_background(&mut self, color: Rgb) {
        self.background = color;
        self.clean();
    }

    /// Resizes the viewport window into the raster. Raster contents are
    /// untouched; the cycle restarts with a full refresh.
    pub fn set_viewport_size(&mut self, width: u32, height: u32) {
        let size = (
            width.clamp(MINIMUM_WIDTH, self.raster_size.0),
            height.clamp(MINIMUM_HEIGHT, self.raster_size.1),
        );
        if size == self.viewport {
            return;
        }
        self.viewport = size;
        self.request_refresh();
        self.transition(PaintState::Refresh);
        self.sprite_cursor = 0;
        self.pending_damage = None;
        self.overwritten.clear();
    }

    /// Forces the next Refresh phase to repaint the whole viewport, e.g.
    /// after the host surface was occluded.
    pub fn request_refresh(&mut self) {
        self.needs_refresh = true;
    }

    /// RGB of the raster pixel under `point`; background when outside the
    /// raster.
    pub fn color_under(&mut self, point: LogicalPoint) -> Rgb {
        if !point.is_finite() {
            return self.background;
        }
        let (x, y) = self.mapper().to_raster(point);
        let background = self.background;
        self.ensure_raster()
            .pixel(x, y)
            .unwrap_or(background)
    }

    fn ensure_raster(&mut self) -> &mut Raster {
        let (width, height) = self.raster_size;
        let background = self.background;
        self.raster.get_or_insert_with(|| {
            tracing::debug!(width, height, "creating off-screen raster");
            Raster::new(width, height, background)
        })
    }

    fn transition(&mut self, to: PaintState) {
        debug_assert!(
            can_transition(self.paint_state, to),
            "paint state {:?} -> {:?}",
            self.paint_state,
            to
        );
        self.paint_state = to;
    }

    fn viewport_rect(&self) -> DamageRect {
        DamageRect::new(0, 0, self.viewport.0 as i32, self.viewport.1 as i32)
    }

    /// Advances the redraw cycle as far as the surface allows.
    pub fn paint<S: Surface + ?Sized>(&mut self, surface: &mut S) -> PaintProgress {
        let mapper = self.mapper();
        let inset = mapper.inset();

        if self.paint_state == PaintState::Refresh {
            if self.needs_refresh {
                let full = self.viewport_rect();
                let status = match self.raster.as_ref() {
                    None => surface.fill(self.background, full),
                    Some(raster) => surface.blit_raster(raster, inset, full),
                };
                if status == BlitStatus::Pending {
                    return PaintProgress::Suspended(PaintState::Refresh);
                }
                self.needs_refresh = false;
                self.pending_damage = None;
                self.sprites.invalidate_all();
                self.overwritten.push(full);
            }
            self.transition(PaintState::ApplyOperations);
        }

        if self.paint_state == PaintState::ApplyOperations {
            let text_renderer = Arc::clone(&self.text_renderer);
            let queue = Arc::clone(&self.queue);
            let raster = self.ensure_raster();
            let report = queue.drain_and_apply(raster, &mapper, text_renderer.as_ref());
            let drained = report
                .damage
                .and_then(|rect| mapper.raster_rect_to_viewport(rect));
            self.pending_damage = DamageRect::merge(self.pending_damage, drained);

            if let (Some(rect), Some(raster)) = (self.pending_damage, self.raster.as_ref()) {
                if surface.blit_raster(raster, inset, rect) == BlitStatus::Pending {
                    return PaintProgress::Suspended(PaintState::ApplyOperations);
                }
                self.overwritten.push(rect);
                self.pending_damage = None;
            }
            self.transition(PaintState::EraseSprites);
            self.sprite_cursor = 0;
            self.sprites.plan_erase(&mapper, &self.overwritten);
        }

        if self.paint_state == PaintState::EraseSprites {
            while self.sprite_cursor < self.sprites.capacity() {
                let slot = self.sprite_cursor;
                if let Some(rect) = self.sprites.erase_rect(slot) {
                    if let (Some(clip), Some(raster)) =
                        (rect.clamp(self.viewport.0, self.viewport.1), self.raster.as_ref())
                    {
                        if surface.blit_raster(raster, inset, clip) == BlitStatus::Pending {
                            return PaintProgress::Suspended(PaintState::EraseSprites);
                        }
                    }
                    self.sprites.mark_erased(slot);
                }
                self.sprite_cursor += 1;
            }
            self.transition(PaintState::DrawSprites);
            self.sprite_cursor = 0;
        }

        if self.paint_state == PaintState::DrawSprites {
            while self.sprite_cursor < self.sprites.capacity() {
                let slot = self.sprite_cursor;
                if let Some((frame, icon)) = self.sprites.pending_draw(slot, &mapper) {
                    if let Some(clip) = frame.rect.clamp(self.viewport.0, self.viewport.1) {
                        let at = (frame.rect.x, frame.rect.y);
                        if surface.blit_image(&icon, at, clip) == BlitStatus::Pending {
                            return PaintProgress::Suspended(PaintState::DrawSprites);
                        }
                    }
                    self.sprites.mark_drawn(slot, frame);
                }
                self.sprite_cursor += 1;
            }
            self.transition(PaintState::Refresh);
            self.sprite_cursor = 0;
            self.overwritten.clear();
        }

        PaintProgress::Complete
    }
}
