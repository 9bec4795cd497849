use std::path::PathBuf;

use turtle_canvas::canvas::settings_store::{self, CANVAS_SETTINGS_FILE_NAME};
use turtle_canvas::canvas::{FrameSurface, TurtleCanvas};
use turtle_canvas::logging;
use turtle_canvas::turtle::Turtle;

fn cross(turtle: &mut Turtle) {
    let (cx, cy) = (turtle.position().x, turtle.position().y);
    turtle.forward(100.0);
    turtle.back(200.0);
    turtle.forward(100.0);
    turtle.right(90.0);
    turtle.forward(100.0);
    turtle.back(200.0);
    turtle.left(90.0);
    turtle.set_xy(cx, cy);
}

fn square(turtle: &mut Turtle, side: f64) {
    let (cx, cy) = (turtle.position().x, turtle.position().y);
    turtle.pen_up();
    turtle.set_xy(cx - side / 2.0, cy - side / 2.0);
    turtle.pen_down();
    for _ in 0..4 {
        turtle.forward(side);
        turtle.right(90.0);
    }
    turtle.pen_up();
    turtle.set_xy(cx, cy);
}

fn circle(turtle: &mut Turtle, radius: f64) {
    let (cx, cy) = (turtle.position().x, turtle.position().y);
    turtle.pen_up();
    for degree in 0..=360 {
        let radians = f64::from(degree).to_radians();
        turtle.set_xy(
            (cx + radius * radians.cos()).trunc(),
            (cy + radius * radians.sin()).trunc(),
        );
        if degree == 0 {
            turtle.pen_down();
        }
    }
    turtle.pen_up();
    turtle.set_xy(cx, cy);
}

/// Polar rose `r = size * (sin 2t + sin 6t / 4)` traced as pen-down spokes
/// from the current position, so the demo frame shows the rose. Each spoke
/// returns to the centre with the pen up.
fn up_symbol(turtle: &mut Turtle, size: f64) {
    let (cx, cy) = (turtle.position().x, turtle.position().y);
    for degree in 0..360 {
        let radians = f64::from(degree).to_radians();
        let radius = (size * ((2.0 * radians).sin() + 0.25 * (6.0 * radians).sin())).trunc();
        turtle.pen_up();
        turtle.set_xy(cx, cy);
        turtle.set_heading(f64::from(degree));
        turtle.pen_down();
        turtle.forward(radius);
    }
    turtle.pen_up();
    turtle.set_xy(cx, cy);
    turtle.set_heading(0.0);
}

fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CANVAS_SETTINGS_FILE_NAME));
    let settings = settings_store::load_or_default(&settings_path)?;
    logging::init(settings.debug_logging, None);

    let mut canvas = TurtleCanvas::new(settings.clone());
    let mut turtle = Turtle::new(canvas.commands(), &settings);
    canvas.add_sprite(turtle.sprite().clone());

    let (width, height) = canvas.viewport_size();
    let mut surface = FrameSurface::new(width, height);
    canvas.paint(&mut surface);

    cross(&mut turtle);
    square(&mut turtle, 300.0);
    circle(&mut turtle, 125.0);
    up_symbol(&mut turtle, 50.0);
    turtle.label("cross");

    let queued = canvas.queue().len();
    let progress = canvas.paint(&mut surface);
    tracing::info!(
        queued,
        ?progress,
        blits = surface.blits(),
        pixel_writes = surface.pixel_writes(),
        "demo frame painted"
    );

    let ink = (0..height as i32)
        .flat_map(|y| (0..width as i32).map(move |x| (x, y)))
        .filter(|&(x, y)| surface.pixel(x, y) != Some(canvas.background()))
        .count();
    println!("painted {queued} operations, {ink} non-background pixels in a {width}x{height} viewport");
    Ok(())
}
