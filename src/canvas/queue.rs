use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::canvas::mapper::CoordinateMapper;
use crate::canvas::ops::GraphicsOp;
use crate::canvas::render::{DamageRect, Raster};
use crate::canvas::text::TextRenderer;

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Union of the rects reported by successfully applied operations, in
    /// raster coordinates.
    pub damage: Option<DamageRect>,
    pub applied: usize,
    pub skipped: usize,
}

#[derive(Debug)]
struct QueueInner {
    ops: Vec<GraphicsOp>,
    capacity: usize,
    growth: usize,
}

/// FIFO buffer of pending graphics operations shared between producers and
/// the redraw thread. Enqueue, drain and clear are one critical section.
#[derive(Debug)]
pub struct OperationQueue {
    inner: Mutex<QueueInner>,
    drained: Condvar,
}

impl OperationQueue {
    pub fn new(initial_capacity: usize, growth: usize) -> Self {
        let capacity = initial_capacity.max(1);
        Self {
            inner: Mutex::new(QueueInner {
                ops: Vec::with_capacity(capacity),
                capacity,
                growth: growth.max(1),
            }),
            drained: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, op: GraphicsOp) {
        let mut inner = self.lock();
        if inner.ops.len() == inner.capacity {
            let growth = inner.growth;
            inner.ops.reserve_exact(growth);
            inner.capacity += growth;
            tracing::debug!(capacity = inner.capacity, "expanded graphics op queue");
        }
        inner.ops.push(op);
        self.drained.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical capacity; grows by the configured increment and never shrinks.
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Applies every pending operation in enqueue order. A failing operation
    /// is logged and skipped; the rest of the batch still applies.
    pub fn drain_and_apply(
        &self,
        raster: &mut Raster,
        mapper: &CoordinateMapper,
        text_renderer: &dyn TextRenderer,
    ) -> DrainReport {
        let mut inner = self.lock();
        let mut report = DrainReport::default();
        for op in inner.ops.drain(..) {
            match op.apply(raster, mapper, text_renderer) {
                Ok(rect) => {
                    report.applied += 1;
                    report.damage = DamageRect::merge(report.damage, rect);
                }
                Err(err) => {
                    report.skipped += 1;
                    tracing::warn!(error = %err, kind = op.kind(), "skipping graphics op");
                }
            }
        }
        drop(inner);
        self.drained.notify_all();
        report
    }

    /// Discards pending operations without applying them.
    pub fn clear(&self) -> usize {
        let mut inner = self.lock();
        let discarded = inner.ops.len();
        inner.ops.clear();
        drop(inner);
        self.drained.notify_all();
        discarded
    }

    /// Blocks until the queue is empty or `timeout` elapses. Returns whether
    /// the queue was observed empty.
    pub fn wait_drained(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        while !inner.ops.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .drained
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            inner = guard;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::model::{FontSpec, LogicalPoint, Rgb};
    use crate::canvas::text::BlockTextRenderer;
    use std::sync::Arc;

    fn line(x: f64) -> GraphicsOp {
        GraphicsOp::Line {
            from: LogicalPoint::new(x, 0.0),
            to: LogicalPoint::new(x, 10.0),
            width: 1,
            color: Rgb::BLACK,
        }
    }

    #[test]
    fn grows_by_fixed_increment_and_keeps_capacity_after_drain() {
        let queue = OperationQueue::new(2, 3);
        for i in 0..3 {
            queue.enqueue(line(i as f64));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.capacity(), 5);

        let mut raster = Raster::new(101, 101, Rgb::WHITE);
        let mapper = CoordinateMapper::new((101, 101), (50, 50));
        let report = queue.drain_and_apply(&mut raster, &mapper, &BlockTextRenderer);
        assert_eq!(report.applied, 3);
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.capacity(), 5);
    }

    #[test]
    fn applies_in_fifo_order() {
        let queue = OperationQueue::new(4, 4);
        let red = Rgb::new(255, 0, 0);
        queue.enqueue(GraphicsOp::Line {
            from: LogicalPoint::new(-5.0, 0.0),
            to: LogicalPoint::new(5.0, 0.0),
            width: 1,
            color: Rgb::BLACK,
        });
        queue.enqueue(GraphicsOp::Line {
            from: LogicalPoint::new(-5.0, 0.0),
            to: LogicalPoint::new(5.0, 0.0),
            width: 1,
            color: red,
        });
        let mut raster = Raster::new(101, 101, Rgb::WHITE);
        let mapper = CoordinateMapper::new((101, 101), (50, 50));
        queue.drain_and_apply(&mut raster, &mapper, &BlockTextRenderer);
        assert_eq!(raster.pixel(50, 50), Some(red));
    }

    #[test]
    fn failing_op_is_skipped_and_excluded_from_damage() {
        let queue = OperationQueue::new(4, 4);
        queue.enqueue(line(f64::INFINITY));
        queue.enqueue(line(0.0));
        let mut raster = Raster::new(101, 101, Rgb::WHITE);
        let mapper = CoordinateMapper::new((101, 101), (50, 50));
        let report = queue.drain_and_apply(&mut raster, &mapper, &BlockTextRenderer);
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.damage, Some(DamageRect::new(50, 40, 1, 11)));
    }

    #[test]
    fn mixed_batch_damage_is_the_union_of_each_ops_rect() {
        let mut raster = Raster::new(101, 101, Rgb::WHITE);
        for (a, b) in [
            ((40, 40), (60, 40)),
            ((60, 40), (60, 60)),
            ((60, 60), (40, 60)),
            ((40, 60), (40, 40)),
        ] {
            raster.draw_segment(a, b, 1, Rgb::BLACK);
        }
        let mapper = CoordinateMapper::new((101, 101), (50, 50));
        let red = Rgb::new(255, 0, 0);
        let batch = vec![
            GraphicsOp::Line {
                from: LogicalPoint::new(-40.0, 30.0),
                to: LogicalPoint::new(-20.0, 30.0),
                width: 3,
                color: Rgb::BLACK,
            },
            GraphicsOp::Fill {
                seed: LogicalPoint::ORIGIN,
                color: red,
            },
            GraphicsOp::Label {
                text: "edge".into(),
                anchor: LogicalPoint::new(45.0, -40.0),
                font: FontSpec::default(),
                color: Rgb::BLACK,
            },
        ];

        let mut alone = raster.clone();
        let rects: Vec<DamageRect> = batch
            .iter()
            .map(|op| {
                op.apply(&mut alone, &mapper, &BlockTextRenderer)
                    .expect("apply")
                    .expect("damage")
            })
            .collect();
        assert_eq!(rects[1], DamageRect::new(41, 41, 19, 19));
        assert_eq!(rects[2].right(), 101, "label should run off the raster");
        let expected = rects.iter().copied().reduce(DamageRect::union);

        let queue = OperationQueue::new(2, 2);
        for op in batch {
            queue.enqueue(op);
        }
        let report = queue.drain_and_apply(&mut raster, &mapper, &BlockTextRenderer);
        assert_eq!(report.applied, 3);
        assert_eq!(report.damage, expected);
        assert_eq!(raster, alone);
    }

    #[test]
    fn clear_discards_without_applying() {
        let queue = OperationQueue::new(4, 4);
        queue.enqueue(line(0.0));
        queue.enqueue(line(1.0));
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn wait_drained_wakes_after_drain_on_another_thread() {
        let queue = Arc::new(OperationQueue::new(4, 4));
        queue.enqueue(line(0.0));
        assert!(!queue.wait_drained(Duration::from_millis(10)));

        let worker = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(20));
                let mut raster = Raster::new(101, 101, Rgb::WHITE);
                let mapper = CoordinateMapper::new((101, 101), (50, 50));
                queue.drain_and_apply(&mut raster, &mapper, &BlockTextRenderer)
            })
        };
        assert!(queue.wait_drained(Duration::from_secs(5)));
        let report = worker.join().expect("drain thread");
        assert_eq!(report.applied, 1);
    }
}
