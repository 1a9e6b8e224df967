//! Border following on a [`BinaryMask`].

use imageproc::contours::{find_contours, BorderType};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use leafscan_core::{arc_length, polygon_area};

use crate::params::{ChainApproximation, ContourParams, ContourRetrieval};
use crate::segmentation::BinaryMask;

/// One traced, closed blob boundary in pixel coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
    /// `true` for the border of a hole inside a blob.
    pub is_hole: bool,
}

impl Contour {
    pub fn new(points: Vec<Point2<i32>>) -> Self {
        Self {
            points,
            is_hole: false,
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    #[inline]
    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points, true)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Interleaved `[x0, y0, x1, y1, ...]`.
    pub fn flatten(&self) -> Vec<i32> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    /// Inverse of [`Contour::flatten`]. A trailing odd value is ignored.
    pub fn from_flat(flat: &[i32]) -> Self {
        Self::new(
            flat.chunks_exact(2)
                .map(|xy| Point2::new(xy[0], xy[1]))
                .collect(),
        )
    }
}

/// Trace every foreground border of `mask`.
///
/// Ordering follows the raster scan of the tracer and is stable for a given
/// mask.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(mask, params), fields(width = mask.width(), height = mask.height()))
)]
pub fn extract_contours(mask: &BinaryMask, params: &ContourParams) -> Vec<Contour> {
    let raw = find_contours::<i32>(mask.as_gray());
    let traced = raw.len();

    let out: Vec<Contour> = raw
        .into_iter()
        .filter(|c| match params.retrieval {
            ContourRetrieval::List => true,
            ContourRetrieval::External => c.border_type == BorderType::Outer && c.parent.is_none(),
        })
        .map(|c| {
            let points: Vec<Point2<i32>> = c.points.iter().map(|p| Point2::new(p.x, p.y)).collect();
            let points = match params.approximation {
                ChainApproximation::None => points,
                ChainApproximation::Simple => compress_chain(&points),
            };
            Contour {
                points,
                is_hole: c.border_type == BorderType::Hole,
            }
        })
        .collect();

    log::debug!("traced {} borders, kept {}", traced, out.len());
    out
}

/// Drop vertices whose incoming and outgoing steps are identical, keeping
/// only the ends of each straight run.
pub fn compress_chain(points: &[Point2<i32>]) -> Vec<Point2<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    let kept: Vec<Point2<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            cur - prev != next - cur
        })
        .map(|i| points[i])
        .collect();
    if kept.is_empty() {
        points[..1].to_vec()
    } else {
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SegmentationParams;
    use crate::segmentation::segment;
    use image::{Rgba, RgbaImage};

    fn scene_with_ring() -> RgbaImage {
        // 60x60 dark ring (outer 20..80, hole 35..65) on white.
        RgbaImage::from_fn(100, 100, |x, y| {
            let outer = (20..80).contains(&x) && (20..80).contains(&y);
            let hole = (35..65).contains(&x) && (35..65).contains(&y);
            if outer && !hole {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn list_mode_returns_holes() {
        let mask = segment(&scene_with_ring(), &SegmentationParams::default());
        let contours = extract_contours(&mask, &ContourParams::default());
        assert_eq!(contours.len(), 2);
        assert_eq!(contours.iter().filter(|c| c.is_hole).count(), 1);
    }

    #[test]
    fn external_mode_drops_holes() {
        let mask = segment(&scene_with_ring(), &SegmentationParams::default());
        let params = ContourParams {
            retrieval: ContourRetrieval::External,
            ..ContourParams::default()
        };
        let contours = extract_contours(&mask, &params);
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].is_hole);
        assert_eq!(contours[0].area(), 59.0 * 59.0);
    }

    #[test]
    fn simple_chain_keeps_square_corners_only() {
        let mask = segment(&scene_with_ring(), &SegmentationParams::default());
        let params = ContourParams {
            retrieval: ContourRetrieval::External,
            approximation: ChainApproximation::Simple,
        };
        let simple = extract_contours(&mask, &params);
        let dense = extract_contours(
            &mask,
            &ContourParams {
                retrieval: ContourRetrieval::External,
                approximation: ChainApproximation::None,
            },
        );
        assert_eq!(simple[0].len(), 4);
        assert!(dense[0].len() > 200);
        assert_eq!(simple[0].area(), dense[0].area());
        assert_eq!(simple[0].perimeter(), dense[0].perimeter());
    }

    #[test]
    fn flat_snapshot_round_trip() {
        let c = Contour::new(vec![Point2::new(1, 2), Point2::new(3, 4), Point2::new(5, 6)]);
        let flat = c.flatten();
        assert_eq!(flat, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(Contour::from_flat(&flat), c);
    }

    #[test]
    fn compress_keeps_short_chains() {
        let pts = vec![Point2::new(0, 0), Point2::new(1, 0)];
        assert_eq!(compress_chain(&pts), pts);
    }
}
