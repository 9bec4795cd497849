use anyhow::{anyhow, Result};

use crate::canvas::model::{FontSpec, Rgb};
use crate::canvas::render::{DamageRect, Raster};

/// Seam to the font subsystem. Implementations draw `text` with its baseline
/// starting at `anchor` (raster pixels) and report the measured bounds.
pub trait TextRenderer: Send + Sync {
    fn draw_text(
        &self,
        raster: &mut Raster,
        text: &str,
        anchor: (i32, i32),
        font: &FontSpec,
        color: Rgb,
    ) -> Result<Option<DamageRect>>;
}

/// Fallback renderer with fixed monospace metrics. Each visible character is
/// drawn as a solid glyph block inside its cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockTextRenderer;

impl BlockTextRenderer {
    pub fn advance(font: &FontSpec) -> i64 {
        (i64::from(font.size) * 3 / 5).max(1)
    }

    pub fn ascent(font: &FontSpec) -> i64 {
        (i64::from(font.size) * 4 / 5).max(1)
    }

    /// Bounds of `text` at `anchor`, before cropping to any raster.
    pub fn measure(text: &str, anchor: (i32, i32), font: &FontSpec) -> Option<DamageRect> {
        let chars = text.chars().count() as i64;
        if chars == 0 {
            return None;
        }
        let left = i64::from(anchor.0);
        let top = i64::from(anchor.1) - Self::ascent(font);
        Some(DamageRect::from_span(
            (left, top),
            (
                left + chars * Self::advance(font),
                top + i64::from(font.size),
            ),
        ))
    }
}

impl TextRenderer for BlockTextRenderer {
    fn draw_text(
        &self,
        raster: &mut Raster,
        text: &str,
        anchor: (i32, i32),
        font: &FontSpec,
        color: Rgb,
    ) -> Result<Option<DamageRect>> {
        if font.size == 0 {
            return Err(anyhow!("font {} has zero size", font.family));
        }
        let Some(bounds) = Self::measure(text, anchor, font) else {
            return Ok(None);
        };

        let advance = Self::advance(font);
        let glyph_top = i64::from(anchor.1) - Self::ascent(font) + 1;
        let glyph_size = ((advance - 2).max(1), (Self::ascent(font) - 1).max(1));
        let raster_right = i64::from(raster.width());
        for (idx, ch) in text.chars().enumerate() {
            let cell_x = i64::from(anchor.0) + idx as i64 * advance;
            if cell_x >= raster_right {
                break;
            }
            if ch.is_whitespace() || cell_x + advance <= 0 {
                continue;
            }
            let glyph = DamageRect::from_span(
                (cell_x + 1, glyph_top),
                (cell_x + 1 + glyph_size.0, glyph_top + glyph_size.1),
            );
            raster.fill_rect(glyph, color);
        }

        Ok(bounds.clamp(raster.width(), raster.height()))
    }
}
