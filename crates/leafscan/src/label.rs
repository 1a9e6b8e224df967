//! Leaf-number text: the bundled label font and ink-box layout.
//!
//! Text is rasterised by `imageproc::drawing::draw_text_mut`. The layout
//! below walks glyphs exactly as it does, so the box it returns is where
//! ink actually lands relative to the drawing origin.

use ab_glyph::{point, Font, FontRef, GlyphId, InvalidFont, PxScale, ScaleFont};
use nalgebra::Point2;

/// DejaVu Sans Bold, see `fonts/LICENSE-DejaVu`.
static LABEL_FONT: &[u8] = include_bytes!("../fonts/DejaVuSans-Bold.ttf");

pub fn label_font() -> Result<FontRef<'static>, InvalidFont> {
    FontRef::try_from_slice(LABEL_FONT)
}

/// Inked pixel box of `text`, as `[min, max)` offsets from the origin
/// passed to `draw_text_mut`. `None` when nothing would be drawn.
pub fn ink_bounds(
    font: &impl Font,
    scale: PxScale,
    text: &str,
) -> Option<(Point2<i32>, Point2<i32>)> {
    let scaled = font.as_scaled(scale);
    let mut x = 0f32;
    let mut last: Option<GlyphId> = None;
    let mut bounds: Option<(Point2<i32>, Point2<i32>)> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        let glyph = id.with_scale_and_position(scale, point(x, scaled.ascent()));
        x += scaled.h_advance(id);
        let Some(outlined) = scaled.outline_glyph(glyph) else {
            continue;
        };
        if let Some(prev) = last {
            x += scaled.kern(id, prev);
        }
        last = Some(id);

        let bb = outlined.px_bounds();
        let min = Point2::new(bb.min.x.round() as i32, bb.min.y.round() as i32);
        let max = Point2::new(min.x + bb.width() as i32, min.y + bb.height() as i32);
        bounds = Some(match bounds {
            None => (min, max),
            Some((lo, hi)) => (
                Point2::new(lo.x.min(min.x), lo.y.min(min.y)),
                Point2::new(hi.x.max(max.x), hi.y.max(max.y)),
            ),
        });
    }
    bounds
}

/// Drawing origin that centres the ink of `text` on `center`.
pub fn centred_origin(
    font: &impl Font,
    scale: PxScale,
    text: &str,
    center: Point2<i32>,
) -> Option<Point2<i32>> {
    let (min, max) = ink_bounds(font, scale, text)?;
    Some(Point2::new(
        center.x - (min.x + max.x) / 2,
        center.y - (min.y + max.y) / 2,
    ))
}
