//! Overlay drawing: reference outline, leaf outlines and leaf numbers.
//!
//! Both the primary path ([`annotate`]) and the re-render path
//! ([`rerender`]) go through the same drawing routines and the same
//! [`AnnotationStyle`], so a re-rendered image cannot be told apart from a
//! fresh one with the same leaves.

use std::io::Cursor;

use ab_glyph::{Font, PxScale};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::contours::Contour;
use crate::error::AnnotationError;
use crate::label::centred_origin;
use crate::measure::LeafMetric;

pub use crate::label::label_font;

/// RGBA colour as stored in configs and reports.
pub type Color = [u8; 4];

pub const GREEN: Color = [0, 255, 0, 255];
pub const BLUE: Color = [0, 0, 255, 255];
pub const RED: Color = [255, 0, 0, 255];
pub const WHITE: Color = [255, 255, 255, 255];

/// Upper bounds accepted for [`AnnotationStyle`] sizes, in pixels.
pub const MAX_STROKE_PX: u32 = 64;
pub const MAX_LABEL_PX: f32 = 512.0;
pub const MAX_LABEL_OUTLINE_PX: u32 = 16;
pub const MAX_MARKER_RADIUS_PX: u32 = 1024;

/// Colours and stroke sizes shared by every annotation path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    pub reference_color: Color,
    pub reference_thickness: u32,
    pub leaf_color: Color,
    pub leaf_thickness: u32,
    pub label_color: Color,
    pub label_outline: Color,
    /// Font size of leaf numbers, in pixels.
    pub label_px: f32,
    /// Halo width drawn around the label text; 0 disables it.
    pub label_outline_px: u32,
    /// Disk drawn under a label whose contour could not be drawn.
    pub marker_color: Color,
    pub marker_radius: u32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            reference_color: GREEN,
            reference_thickness: 3,
            leaf_color: BLUE,
            leaf_thickness: 4,
            label_color: RED,
            label_outline: WHITE,
            label_px: 40.0,
            label_outline_px: 2,
            marker_color: WHITE,
            marker_radius: 12,
        }
    }
}

/// Parse a flattened `[x0, y0, x1, y1, ...]` snapshot into a drawable polygon.
pub fn snapshot_points(flat: &[i32]) -> Result<Vec<Point2<i32>>, AnnotationError> {
    if flat.is_empty() {
        return Err(AnnotationError::EmptySnapshot);
    }
    if flat.len() % 2 != 0 {
        return Err(AnnotationError::OddSnapshotLength { len: flat.len() });
    }
    let points = Contour::from_flat(flat).points;
    if points.len() < 3 {
        return Err(AnnotationError::TooFewPoints {
            points: points.len(),
        });
    }
    Ok(points)
}

/// Closed polyline with a square brush `thickness` pixels wide.
pub fn draw_thick_polyline(
    img: &mut RgbaImage,
    points: &[Point2<i32>],
    color: Color,
    thickness: u32,
) {
    let n = points.len();
    if n == 0 {
        return;
    }
    let t = thickness.max(1) as i32;
    let lo = -((t - 1) / 2);
    let hi = t / 2;
    let color = Rgba(color);
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        for dy in lo..=hi {
            for dx in lo..=hi {
                draw_line_segment_mut(
                    img,
                    ((a.x + dx) as f32, (a.y + dy) as f32),
                    ((b.x + dx) as f32, (b.y + dy) as f32),
                    color,
                );
            }
        }
    }
}

/// Draw `text` with its ink centred on `center`, halo first.
pub fn draw_label(
    img: &mut RgbaImage,
    font: &impl Font,
    text: &str,
    center: Point2<i32>,
    style: &AnnotationStyle,
) {
    let scale = PxScale::from(style.label_px);
    let Some(origin) = centred_origin(font, scale, text, center) else {
        return;
    };

    let pad = style.label_outline_px as i32;
    let halo = Rgba(style.label_outline);
    for dy in -pad..=pad {
        for dx in -pad..=pad {
            if (dx, dy) != (0, 0) && dx * dx + dy * dy <= pad * pad {
                draw_text_mut(img, halo, origin.x + dx, origin.y + dy, scale, font, text);
            }
        }
    }
    draw_text_mut(img, Rgba(style.label_color), origin.x, origin.y, scale, font, text);
}

fn draw_marker(img: &mut RgbaImage, center: Point2<i32>, style: &AnnotationStyle) {
    if style.marker_radius > 0 {
        draw_filled_circle_mut(
            img,
            (center.x, center.y),
            style.marker_radius as i32,
            Rgba(style.marker_color),
        );
    }
}

/// Outlines and numbers for every leaf; returns how many fell back to
/// label-only drawing.
fn draw_leaves(img: &mut RgbaImage, leaves: &[LeafMetric], style: &AnnotationStyle) -> usize {
    let mut degraded = 0;
    let mut label_only = Vec::new();
    for leaf in leaves {
        match snapshot_points(&leaf.contour) {
            Ok(points) => draw_thick_polyline(img, &points, style.leaf_color, style.leaf_thickness),
            Err(err) => {
                log::warn!("leaf {} ({}): {err}; drawing label only", leaf.id, leaf.tag);
                degraded += 1;
                label_only.push(leaf.centroid());
            }
        }
    }
    for &c in &label_only {
        draw_marker(img, c, style);
    }
    match label_font() {
        Ok(font) => {
            for leaf in leaves {
                draw_label(img, &font, &leaf.id.to_string(), leaf.centroid(), style);
            }
        }
        Err(err) => log::warn!("label font unusable ({err}); leaves left unnumbered"),
    }
    degraded
}

/// Primary annotation of a fresh analysis.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(leaves = leaves.len()))
)]
pub fn annotate(
    source: &RgbaImage,
    reference: Option<&Contour>,
    leaves: &[LeafMetric],
    style: &AnnotationStyle,
) -> RgbaImage {
    let mut img = source.clone();
    if let Some(sq) = reference {
        draw_thick_polyline(&mut img, &sq.points, style.reference_color, style.reference_thickness);
    }
    let degraded = draw_leaves(&mut img, leaves, style);
    log::debug!("annotated {} leaves ({} label-only)", leaves.len(), degraded);
    img
}

/// Redraw stored leaves on a copy of the original, unannotated raster.
///
/// Only the stored contour snapshots and centroids are used; nothing is
/// re-segmented.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(leaves = leaves.len()))
)]
pub fn rerender(source: &RgbaImage, leaves: &[LeafMetric], style: &AnnotationStyle) -> RgbaImage {
    let mut img = source.clone();
    let degraded = draw_leaves(&mut img, leaves, style);
    log::debug!("re-rendered {} leaves ({} label-only)", leaves.len(), degraded);
    img
}

/// PNG bytes of an annotated raster.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, AnnotationError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(AnnotationError::Encode)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::LeafTag;

    fn blank() -> RgbaImage {
        RgbaImage::from_pixel(200, 200, Rgba([128, 128, 128, 255]))
    }

    fn count(img: &RgbaImage, color: Color) -> usize {
        img.pixels().filter(|p| p.0 == color).count()
    }

    fn leaf(id: u32, contour: Vec<i32>, cx: i32, cy: i32) -> LeafMetric {
        LeafMetric {
            id,
            tag: LeafTag::next(),
            area: 1.0,
            perimeter: 1.0,
            length: 1.0,
            width: 1.0,
            width_to_length_ratio: 1.0,
            cx,
            cy,
            contour,
        }
    }

    #[test]
    fn snapshot_validation() {
        assert!(matches!(snapshot_points(&[]), Err(AnnotationError::EmptySnapshot)));
        assert!(matches!(
            snapshot_points(&[1, 2, 3]),
            Err(AnnotationError::OddSnapshotLength { len: 3 })
        ));
        assert!(matches!(
            snapshot_points(&[1, 2, 3, 4]),
            Err(AnnotationError::TooFewPoints { points: 2 })
        ));
        assert_eq!(snapshot_points(&[0, 0, 5, 0, 5, 5]).map(|p| p.len()).ok(), Some(3));
    }

    #[test]
    fn thick_stroke_is_wider_than_thin() {
        let square = [
            Point2::new(20, 20),
            Point2::new(120, 20),
            Point2::new(120, 120),
            Point2::new(20, 120),
        ];
        let mut thin = blank();
        draw_thick_polyline(&mut thin, &square, BLUE, 1);
        let mut thick = blank();
        draw_thick_polyline(&mut thick, &square, BLUE, 4);
        assert!(count(&thick, BLUE) > 3 * count(&thin, BLUE));
        assert_eq!(thick.get_pixel(70, 70).0, [128, 128, 128, 255]);
    }

    /// Bounding box of pixels exactly equal to `color`.
    fn extent(img: &RgbaImage, color: Color) -> Option<(u32, u32, u32, u32)> {
        img.enumerate_pixels()
            .filter(|(_, _, p)| p.0 == color)
            .fold(None, |acc, (x, y, _)| match acc {
                None => Some((x, y, x, y)),
                Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
            })
    }

    #[test]
    fn label_is_centred_on_centroid() {
        let font = label_font().expect("font");
        let mut img = blank();
        draw_label(&mut img, &font, "18", Point2::new(100, 100), &AnnotationStyle::default());

        let (x0, y0, x1, y1) = extent(&img, RED).expect("label ink");
        assert!(((x0 + x1) as i32 / 2 - 100).abs() <= 3, "x {x0}..{x1}");
        assert!(((y0 + y1) as i32 / 2 - 100).abs() <= 3, "y {y0}..{y1}");
        assert!(count(&img, WHITE) > 0);
        assert_eq!(img.get_pixel(5, 5).0, [128, 128, 128, 255]);
    }

    #[test]
    fn halo_surrounds_the_text() {
        let font = label_font().expect("font");
        let style = AnnotationStyle::default();
        let mut img = blank();
        draw_label(&mut img, &font, "4", Point2::new(100, 100), &style);
        let (rx0, ry0, rx1, ry1) = extent(&img, RED).expect("text");
        let (wx0, wy0, wx1, wy1) = extent(&img, WHITE).expect("halo");
        assert!(wx0 < rx0 && wy0 < ry0 && wx1 > rx1 && wy1 > ry1);

        let plain = AnnotationStyle {
            label_outline_px: 0,
            ..style
        };
        let mut img = blank();
        draw_label(&mut img, &font, "4", Point2::new(100, 100), &plain);
        assert_eq!(count(&img, WHITE), 0);
    }

    #[test]
    fn primary_path_draws_reference_and_leaves() {
        let reference = Contour::new(vec![
            Point2::new(10, 10),
            Point2::new(60, 10),
            Point2::new(60, 60),
            Point2::new(10, 60),
        ]);
        let leaves = [leaf(1, vec![100, 100, 180, 100, 180, 150, 100, 150], 140, 125)];
        let img = annotate(&blank(), Some(&reference), &leaves, &AnnotationStyle::default());
        assert!(count(&img, GREEN) > 0);
        assert!(count(&img, BLUE) > 0);
        assert!(count(&img, RED) > 0);
    }

    #[test]
    fn unusable_snapshot_falls_back_to_label() {
        let leaves = [leaf(3, Vec::new(), 100, 100), leaf(4, vec![1, 2, 3], 40, 40)];
        let img = rerender(&blank(), &leaves, &AnnotationStyle::default());
        assert_eq!(count(&img, BLUE), 0);
        assert!(count(&img, RED) > 0);
        assert!(count(&img, WHITE) > 0);
    }

    #[test]
    fn rerender_matches_primary_without_reference() {
        let leaves = [
            leaf(1, vec![20, 20, 90, 25, 80, 90, 25, 70], 55, 50),
            leaf(2, vec![110, 110, 190, 120, 150, 190], 150, 140),
        ];
        let style = AnnotationStyle::default();
        let source = blank();
        assert_eq!(annotate(&source, None, &leaves, &style), rerender(&source, &leaves, &style));
    }

    #[test]
    fn png_encoding() {
        let bytes = encode_png(&blank()).expect("encode");
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = image::load_from_memory(&bytes).expect("decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (200, 200));
    }
}
