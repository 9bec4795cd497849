use anyhow::{anyhow, Result};

use crate::canvas::mapper::CoordinateMapper;
use crate::canvas::model::{FontSpec, LogicalPoint, Rgb};
use crate::canvas::render::{DamageRect, Raster};
use crate::canvas::text::TextRenderer;

/// One deferred drawing action. Immutable once queued.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsOp {
    Line {
        from: LogicalPoint,
        to: LogicalPoint,
        width: u32,
        color: Rgb,
    },
    Fill {
        seed: LogicalPoint,
        color: Rgb,
    },
    Label {
        text: String,
        anchor: LogicalPoint,
        font: FontSpec,
        color: Rgb,
    },
}

impl GraphicsOp {
    pub fn kind(&self) -> &'static str {
        match self {
            GraphicsOp::Line { .. } => "line",
            GraphicsOp::Fill { .. } => "fill",
            GraphicsOp::Label { .. } => "label",
        }
    }

    /// Performs the operation on `raster` and returns the raster-space
    /// rectangle it touched, cropped to the raster.
    pub fn apply(
        &self,
        raster: &mut Raster,
        mapper: &CoordinateMapper,
        text_renderer: &dyn TextRenderer,
    ) -> Result<Option<DamageRect>> {
        match self {
            GraphicsOp::Line {
                from,
                to,
                width,
                color,
            } => {
                ensure_finite(*from)?;
                ensure_finite(*to)?;
                let start = mapper.raster_position(*from);
                let end = mapper.raster_position(*to);
                Ok(raster.stroke_line(start, end, *width, *color))
            }
            GraphicsOp::Fill { seed, color } => {
                ensure_finite(*seed)?;
                Ok(raster.flood_fill(mapper.to_raster(*seed), *color))
            }
            GraphicsOp::Label {
                text,
                anchor,
                font,
                color,
            } => {
                ensure_finite(*anchor)?;
                let at = mapper.to_raster(*anchor);
                text_renderer.draw_text(raster, text, at, font, *color)
            }
        }
    }
}

fn ensure_finite(point: LogicalPoint) -> Result<()> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(anyhow!("non-finite coordinate ({}, {})", point.x, point.y))
    }
}
