//! Per-leaf geometric measurement.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Point2;
use serde::{Deserialize, Deserializer, Serialize};

use leafscan_core::{min_area_rect, pixel_centroid, principal_extents};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::calibration::CalibrationFactors;
use crate::contours::Contour;
use crate::params::{DimensionMethod, MeasurementParams};

/// Leaf identity, stable across renumbering and re-renders.
///
/// Tags come from a process-wide counter. Deserializing a tag (e.g. from
/// a saved report) moves the counter past it, so leaves loaded into a
/// process never share a tag with leaves measured later in it. Tags from
/// reports written by different processes may still coincide.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct LeafTag(u64);

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

impl LeafTag {
    /// Allocate a tag not yet handed out or loaded in this process.
    pub fn next() -> Self {
        Self(NEXT_TAG.fetch_add(1, Ordering::Relaxed))
    }

    fn observe(raw: u64) -> Self {
        NEXT_TAG.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for LeafTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(Self::observe)
    }
}

impl fmt::Display for LeafTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leaf-{:06x}", self.0)
    }
}

/// One measured leaf.
///
/// Lengths are in the caller's real unit (the unit whose square the
/// reference area was given in), areas in that unit squared. `cx`, `cy`
/// and `contour` stay in pixel space for re-annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeafMetric {
    /// 1-based, dense, reassigned whenever the leaf set changes.
    pub id: u32,
    pub tag: LeafTag,
    pub area: f64,
    pub perimeter: f64,
    /// Longer side of the measured extent; never below `width`.
    pub length: f64,
    pub width: f64,
    /// `width / length`, 0 when `length` is 0.
    pub width_to_length_ratio: f64,
    pub cx: i32,
    pub cy: i32,
    /// Interleaved `[x0, y0, x1, y1, ...]` contour vertices.
    pub contour: Vec<i32>,
}

impl LeafMetric {
    #[inline]
    pub fn centroid(&self) -> Point2<i32> {
        Point2::new(self.cx, self.cy)
    }

    /// Rebuild the stored contour snapshot.
    pub fn contour_points(&self) -> Contour {
        Contour::from_flat(&self.contour)
    }
}

/// Pixel-space geometry of one leaf before calibration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelGeometry {
    pub area: f64,
    pub perimeter: f64,
    pub width: f64,
    pub length: f64,
    pub centroid: Point2<i32>,
}

/// `(short, long)` pixel extents of a contour.
pub fn pixel_dimensions(contour: &Contour, method: DimensionMethod) -> (f64, f64) {
    const MIN_PCA_POINTS: usize = 5;
    if method == DimensionMethod::PrincipalAxes && contour.len() >= MIN_PCA_POINTS {
        if let Some(ext) = principal_extents(&contour.points) {
            return (ext.minor, ext.major);
        }
    }
    min_area_rect(&contour.points).sides_sorted()
}

pub fn pixel_geometry(contour: &Contour, params: &MeasurementParams) -> PixelGeometry {
    let (width, length) = pixel_dimensions(contour, params.dimensions);
    PixelGeometry {
        area: contour.area(),
        perimeter: contour.perimeter(),
        width,
        length,
        centroid: pixel_centroid(&contour.points).unwrap_or_else(|| Point2::new(0, 0)),
    }
}

/// Turn pixel geometry into a [`LeafMetric`] with a fresh tag.
pub fn calibrate_leaf(
    id: u32,
    contour: &Contour,
    geom: &PixelGeometry,
    factors: &CalibrationFactors,
) -> LeafMetric {
    let width = factors.length(geom.width);
    let length = factors.length(geom.length);
    LeafMetric {
        id,
        tag: LeafTag::next(),
        area: factors.area(geom.area),
        perimeter: factors.length(geom.perimeter),
        length,
        width,
        width_to_length_ratio: if length > 0.0 { width / length } else { 0.0 },
        cx: geom.centroid.x,
        cy: geom.centroid.y,
        contour: contour.flatten(),
    }
}

/// Measure every leaf contour.
///
/// Ids follow the order of `leaves` (extraction order) even when the pixel
/// work runs in parallel.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(leaves, factors, params), fields(leaves = leaves.len()))
)]
pub fn measure_leaves(
    leaves: &[Contour],
    factors: &CalibrationFactors,
    params: &MeasurementParams,
) -> Vec<LeafMetric> {
    #[cfg(feature = "rayon")]
    let geometry: Vec<PixelGeometry> = leaves.par_iter().map(|c| pixel_geometry(c, params)).collect();
    #[cfg(not(feature = "rayon"))]
    let geometry: Vec<PixelGeometry> = leaves.iter().map(|c| pixel_geometry(c, params)).collect();

    leaves
        .iter()
        .zip(&geometry)
        .enumerate()
        .map(|(i, (contour, geom))| calibrate_leaf(i as u32 + 1, contour, geom, factors))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rect(x0: i32, y0: i32, w: i32, h: i32) -> Contour {
        Contour::new(vec![
            Point2::new(x0, y0),
            Point2::new(x0 + w, y0),
            Point2::new(x0 + w, y0 + h),
            Point2::new(x0, y0 + h),
        ])
    }

    const UNIT: CalibrationFactors = CalibrationFactors {
        linear: 1.0,
        areal: 1.0,
    };

    #[test]
    fn tall_rectangle_reports_length_as_long_side() {
        let leaves = [rect(0, 0, 20, 90)];
        let m = measure_leaves(&leaves, &UNIT, &MeasurementParams::default());
        assert_eq!(m.len(), 1);
        assert_abs_diff_eq!(m[0].length, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m[0].width, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m[0].width_to_length_ratio, 20.0 / 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m[0].area, 1800.0);
        assert_abs_diff_eq!(m[0].perimeter, 220.0);
        assert_eq!((m[0].cx, m[0].cy), (10, 45));
    }

    #[test]
    fn rotated_leaf_keeps_its_dimensions() {
        // 40 x 30 rectangle rotated by atan(3/4).
        let c = Contour::new(vec![
            Point2::new(100, 100),
            Point2::new(132, 124),
            Point2::new(114, 148),
            Point2::new(82, 124),
        ]);
        let m = measure_leaves(&[c], &UNIT, &MeasurementParams::default());
        assert_abs_diff_eq!(m[0].length, 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m[0].width, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn principal_axes_method() {
        let mut pts = Vec::new();
        for x in 0..=60 {
            pts.push(Point2::new(x, 0));
        }
        for x in (0..=60).rev() {
            pts.push(Point2::new(x, 12));
        }
        let params = MeasurementParams {
            dimensions: DimensionMethod::PrincipalAxes,
        };
        let (w, l) = pixel_dimensions(&Contour::new(pts), params.dimensions);
        assert_abs_diff_eq!(l, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(w, 12.0, epsilon = 1e-9);
    }

    #[test]
    fn calibration_is_applied() {
        let f = CalibrationFactors {
            linear: 0.5,
            areal: 0.25,
        };
        let m = measure_leaves(&[rect(0, 0, 10, 40)], &f, &MeasurementParams::default());
        assert_abs_diff_eq!(m[0].area, 100.0);
        assert_abs_diff_eq!(m[0].perimeter, 50.0);
        assert_abs_diff_eq!(m[0].length, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m[0].width, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn ids_follow_input_order_and_tags_are_unique() {
        let leaves = [rect(0, 0, 10, 40), rect(50, 0, 30, 40), rect(100, 0, 5, 5)];
        let m = measure_leaves(&leaves, &UNIT, &MeasurementParams::default());
        assert_eq!(m.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_abs_diff_eq!(m[1].area, 1200.0);
        assert_ne!(m[0].tag, m[1].tag);
        assert_ne!(m[1].tag, m[2].tag);
        assert_eq!(m[2].contour_points(), leaves[2]);
    }

    #[test]
    fn loaded_tags_are_never_reissued() {
        let loaded: Vec<LeafTag> = serde_json::from_str("[7, 40000000000]").expect("tags");
        assert_eq!(loaded[1].get(), 40_000_000_000);
        let fresh = LeafTag::next();
        assert!(fresh > loaded[1], "{fresh} after loading {}", loaded[1]);
        assert_eq!(serde_json::to_string(&loaded[0]).expect("json"), "7");
    }

    #[test]
    fn zero_length_ratio_is_zero() {
        let m = measure_leaves(
            &[Contour::new(vec![Point2::new(4, 4)])],
            &UNIT,
            &MeasurementParams::default(),
        );
        assert_eq!(m[0].width_to_length_ratio, 0.0);
        assert_eq!(m[0].length, 0.0);
    }
}
