//! Convex hull and minimum-area enclosing rectangle.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Rectangle at arbitrary orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2<f64>,
    /// Side length along `angle_deg`.
    pub width: f64,
    /// Side length perpendicular to `angle_deg`.
    pub height: f64,
    /// Direction of the `width` side in degrees, image frame.
    pub angle_deg: f64,
}

impl RotatedRect {
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// `(short, long)` side lengths regardless of orientation.
    #[inline]
    pub fn sides_sorted(&self) -> (f64, f64) {
        (self.width.min(self.height), self.width.max(self.height))
    }

    pub fn corners(&self) -> [Point2<f64>; 4] {
        let t = self.angle_deg.to_radians();
        let u = Vector2::new(t.cos(), t.sin()) * (0.5 * self.width);
        let v = Vector2::new(-t.sin(), t.cos()) * (0.5 * self.height);
        let c = self.center;
        [c - u - v, c + u - v, c + u + v, c - u + v]
    }
}

#[inline]
fn turn(o: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Andrew's monotone chain. Returns hull vertices counter-clockwise
/// (y-up convention) without repeating the first vertex; collinear input
/// collapses to its two extreme points.
pub fn convex_hull(points: &[Point2<i32>]) -> Vec<Point2<f64>> {
    let mut pts: Vec<Point2<f64>> = points
        .iter()
        .map(|p| Point2::new(p.x as f64, p.y as f64))
        .collect();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(2 * pts.len());
    for &p in &pts {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Minimum-area rectangle enclosing all `points`, by rotating calipers over
/// the hull edges.
///
/// Empty input yields a zero rectangle at the origin; a single point or a
/// collinear set yields a rectangle with zero height.
pub fn min_area_rect(points: &[Point2<i32>]) -> RotatedRect {
    let hull = convex_hull(points);
    match hull.len() {
        0 => return RotatedRect::default(),
        1 => {
            return RotatedRect {
                center: hull[0],
                ..RotatedRect::default()
            }
        }
        2 => {
            let d = hull[1] - hull[0];
            return RotatedRect {
                center: Point2::from((hull[0].coords + hull[1].coords) * 0.5),
                width: d.norm(),
                height: 0.0,
                angle_deg: d.y.atan2(d.x).to_degrees(),
            };
        }
        _ => {}
    }

    let n = hull.len();
    let mut best: Option<(f64, RotatedRect)> = None;
    for i in 0..n {
        let edge = hull[(i + 1) % n] - hull[i];
        let len = edge.norm();
        if len <= f64::EPSILON {
            continue;
        }
        let u = edge / len;
        let v = Vector2::new(-u.y, u.x);

        let (mut u_min, mut u_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &hull {
            let rel = p - hull[i];
            let pu = rel.dot(&u);
            let pv = rel.dot(&v);
            u_min = u_min.min(pu);
            u_max = u_max.max(pu);
            v_min = v_min.min(pv);
            v_max = v_max.max(pv);
        }

        let width = u_max - u_min;
        let height = v_max - v_min;
        let area = width * height;
        if best.as_ref().is_some_and(|(a, _)| *a <= area) {
            continue;
        }
        let mid_u = 0.5 * (u_min + u_max);
        let mid_v = 0.5 * (v_min + v_max);
        let center = hull[i] + u * mid_u + v * mid_v;
        best = Some((
            area,
            RotatedRect {
                center,
                width,
                height,
                angle_deg: u.y.atan2(u.x).to_degrees(),
            },
        ));
    }

    best.map(|(_, r)| r).unwrap_or_default()
}
