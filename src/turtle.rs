use crate::canvas::engine::CanvasCommands;
use crate::canvas::model::{FontSpec, LogicalPoint, Rgb};
use crate::canvas::settings::CanvasSettings;
use crate::canvas::sprite::SpriteHandle;

/// Logo-style heading (degrees, 0 = north, clockwise) to canvas radians
/// (0 = +x, counter-clockwise).
pub fn compass_to_radians(degrees: f64) -> f64 {
    (90.0 - degrees).rem_euclid(360.0).to_radians()
}

/// A pen that moves over the canvas in turtle space. Every move with the pen
/// down queues a line; the turtle's sprite follows it.
#[derive(Debug, Clone)]
pub struct Turtle {
    commands: CanvasCommands,
    sprite: SpriteHandle,
    position: LogicalPoint,
    heading: f64,
    pen_down: bool,
    pen_color: Rgb,
    pen_width: u32,
    font: FontSpec,
}

impl Turtle {
    /// Creates a turtle at the origin facing north, pen down. Register
    /// [`Turtle::sprite`] with the canvas to make it visible.
    pub fn new(commands: CanvasCommands, settings: &CanvasSettings) -> Self {
        let sprite = SpriteHandle::new(settings.sprite_size, settings.pen_color);
        Self {
            commands,
            sprite,
            position: LogicalPoint::ORIGIN,
            heading: 0.0,
            pen_down: true,
            pen_color: settings.pen_color,
            pen_width: settings.pen_width,
            font: settings.font.clone(),
        }
    }

    pub fn sprite(&self) -> &SpriteHandle {
        &self.sprite
    }

    pub fn position(&self) -> LogicalPoint {
        self.position
    }

    pub fn xcor(&self) -> i32 {
        self.position.x.round() as i32
    }

    pub fn ycor(&self) -> i32 {
        self.position.y.round() as i32
    }

    /// Compass heading in degrees, in `[0, 360)`.
    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn is_pen_down(&self) -> bool {
        self.pen_down
    }

    pub fn pen_up(&mut self) {
        self.pen_down = false;
    }

    pub fn pen_down(&mut self) {
        self.pen_down = true;
    }

    pub fn set_pen_color(&mut self, color: Rgb) {
        self.pen_color = color;
        self.sprite.set_color(color);
    }

    pub fn set_pen_width(&mut self, width: u32) {
        self.pen_width = width.max(1);
    }

    pub fn set_font(&mut self, font: FontSpec) {
        self.font = font;
    }

    pub fn show(&self) {
        self.sprite.set_visible(true);
    }

    pub fn hide(&self) {
        self.sprite.set_visible(false);
    }

    pub fn forward(&mut self, steps: f64) {
        let radians = compass_to_radians(self.heading);
        let end = if self.pen_down {
            self.commands.draw_line_steps(
                self.position,
                steps,
                radians,
                self.pen_width,
                self.pen_color,
            )
        } else {
            self.position.other_end_point(radians, steps)
        };
        self.move_to(end);
    }

    pub fn back(&mut self, steps: f64) {
        self.forward(-steps);
    }

    pub fn left(&mut self, degrees: f64) {
        self.set_heading(self.heading - degrees);
    }

    pub fn right(&mut self, degrees: f64) {
        self.set_heading(self.heading + degrees);
    }

    pub fn set_heading(&mut self, degrees: f64) {
        self.heading = degrees.rem_euclid(360.0);
        self.sprite.set_heading(compass_to_radians(self.heading));
    }

    /// Moves straight to `(x, y)`, drawing when the pen is down.
    pub fn set_xy(&mut self, x: f64, y: f64) {
        let target = LogicalPoint::new(x, y);
        if self.pen_down {
            self.commands
                .draw_line(self.position, target, self.pen_width, self.pen_color);
        }
        self.move_to(target);
    }

    pub fn fill(&self) {
        self.commands.fill(self.position, self.pen_color);
    }

    pub fn label(&self, text: impl Into<String>) {
        self.commands
            .label(text, self.position, self.font.clone(), self.pen_color);
    }

    fn move_to(&mut self, point: LogicalPoint) {
        self.position = point;
        self.sprite.set_position(point);
    }
}
