use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use turtle_canvas::canvas::{CanvasSettings, FrameSurface, LogicalPoint, Rgb, TurtleCanvas};

#[test]
fn producers_enqueue_while_the_canvas_paints() {
    let mut canvas = TurtleCanvas::new(CanvasSettings {
        queue_initial_capacity: 8,
        queue_growth: 8,
        ..CanvasSettings::default()
    });
    let mut surface = FrameSurface::new(700, 400);
    let done = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..4)
        .map(|t| {
            let commands = canvas.commands();
            thread::spawn(move || {
                for i in 0..250 {
                    let y = f64::from(t * 40 + (i % 40));
                    commands.draw_line(
                        LogicalPoint::new(-100.0, y),
                        LogicalPoint::new(100.0, y),
                        1,
                        Rgb::BLACK,
                    );
                }
            })
        })
        .collect();

    let watcher = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for producer in producers {
                producer.join().expect("producer panicked");
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    while !done.load(Ordering::SeqCst) {
        canvas.paint(&mut surface);
    }
    watcher.join().expect("watcher panicked");
    canvas.paint(&mut surface);

    assert!(canvas.queue().is_empty());
    for row in 0..160 {
        assert_eq!(
            canvas.color_under(LogicalPoint::new(0.0, f64::from(row))),
            Rgb::BLACK,
            "row {row} missing"
        );
        assert_eq!(surface.pixel(350, 200 - row), Some(Rgb::BLACK));
    }
}

#[test]
fn queue_grows_past_its_initial_capacity() {
    let canvas = TurtleCanvas::new(CanvasSettings {
        queue_initial_capacity: 4,
        queue_growth: 3,
        ..CanvasSettings::default()
    });
    for _ in 0..9 {
        canvas.fill(LogicalPoint::ORIGIN, Rgb::BLACK);
    }
    assert_eq!(canvas.queue().len(), 9);
    assert_eq!(canvas.queue().capacity(), 10);
}

#[test]
fn wait_drained_unblocks_after_paint() {
    let mut canvas = TurtleCanvas::default();
    let mut surface = FrameSurface::new(700, 400);
    let commands = canvas.commands();
    commands.fill(LogicalPoint::ORIGIN, Rgb::BLACK);

    let waiter = thread::spawn(move || commands.wait_drained(Duration::from_secs(5)));
    thread::sleep(Duration::from_millis(20));
    canvas.paint(&mut surface);
    assert!(waiter.join().expect("waiter panicked"));
}

#[test]
fn wait_drained_times_out_when_nobody_paints() {
    let canvas = TurtleCanvas::default();
    let commands = canvas.commands();
    commands.fill(LogicalPoint::ORIGIN, Rgb::BLACK);
    assert!(!commands.wait_drained(Duration::from_millis(20)));
    assert_eq!(commands.pending(), 1);
}
