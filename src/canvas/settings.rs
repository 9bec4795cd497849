use serde::{Deserialize, Serialize};

use crate::canvas::model::{FontSpec, Rgb};

pub const MINIMUM_WIDTH: u32 = 40;
pub const MINIMUM_HEIGHT: u32 = 40;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanvasSettings {
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    #[serde(default = "default_raster_width")]
    pub raster_width: u32,
    #[serde(default = "default_raster_height")]
    pub raster_height: u32,
    #[serde(default = "default_background")]
    pub background: Rgb,
    #[serde(default = "default_pen_color")]
    pub pen_color: Rgb,
    #[serde(default = "default_pen_width")]
    pub pen_width: u32,
    #[serde(default)]
    pub font: FontSpec,
    #[serde(default = "default_queue_initial_capacity")]
    pub queue_initial_capacity: usize,
    #[serde(default = "default_queue_growth")]
    pub queue_growth: usize,
    #[serde(default = "default_max_sprites")]
    pub max_sprites: usize,
    #[serde(default = "default_max_handlers")]
    pub max_key_handlers: usize,
    #[serde(default = "default_max_handlers")]
    pub max_mouse_handlers: usize,
    #[serde(default = "default_sprite_size")]
    pub sprite_size: u32,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            raster_width: default_raster_width(),
            raster_height: default_raster_height(),
            background: default_background(),
            pen_color: default_pen_color(),
            pen_width: default_pen_width(),
            font: FontSpec::default(),
            queue_initial_capacity: default_queue_initial_capacity(),
            queue_growth: default_queue_growth(),
            max_sprites: default_max_sprites(),
            max_key_handlers: default_max_handlers(),
            max_mouse_handlers: default_max_handlers(),
            sprite_size: default_sprite_size(),
            debug_logging: false,
        }
    }
}

impl CanvasSettings {
    /// Pulls every field into its supported range. Returns whether anything
    /// changed.
    pub fn sanitize(&mut self) -> bool {
        let before = self.clone();

        self.raster_width = odd_at_least(self.raster_width, MINIMUM_WIDTH + 1);
        self.raster_height = odd_at_least(self.raster_height, MINIMUM_HEIGHT + 1);
        self.viewport_width = self.viewport_width.clamp(MINIMUM_WIDTH, self.raster_width);
        self.viewport_height = self
            .viewport_height
            .clamp(MINIMUM_HEIGHT, self.raster_height);
        self.pen_width = self.pen_width.max(1);
        self.font.size = self.font.size.max(1);
        self.queue_initial_capacity = self.queue_initial_capacity.max(1);
        self.queue_growth = self.queue_growth.max(1);
        self.max_sprites = self.max_sprites.max(1);
        self.max_key_handlers = self.max_key_handlers.max(1);
        self.max_mouse_handlers = self.max_mouse_handlers.max(1);
        self.sprite_size = self.sprite_size.max(1);

        *self != before
    }
}

// Odd so the logical origin sits on a pixel with equal counts either side.
fn odd_at_least(value: u32, min: u32) -> u32 {
    let value = value.max(min);
    if value % 2 == 0 {
        value + 1
    } else {
        value
    }
}

fn default_viewport_width() -> u32 {
    700
}

fn default_viewport_height() -> u32 {
    400
}

fn default_raster_width() -> u32 {
    1601
}

fn default_raster_height() -> u32 {
    1201
}

fn default_background() -> Rgb {
    Rgb::WHITE
}

fn default_pen_color() -> Rgb {
    Rgb::BLACK
}

fn default_pen_width() -> u32 {
    2
}

fn default_queue_initial_capacity() -> usize {
    500
}

fn default_queue_growth() -> usize {
    200
}

fn default_max_sprites() -> usize {
    64
}

fn default_max_handlers() -> usize {
    3
}

fn default_sprite_size() -> u32 {
    19
}
