//! Closed-polygon measurements on integer contour vertices.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Zeroth and first order moments of a closed polygon.
///
/// Computed with Green's theorem over the polygon edges, so a contour and
/// its chain-compressed form yield identical values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolygonMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

#[inline]
fn cross(a: Point2<i32>, b: Point2<i32>) -> i64 {
    a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
}

/// Signed shoelace area. Sign follows vertex orientation.
pub fn signed_area(points: &[Point2<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0i64;
    for i in 0..n {
        acc += cross(points[i], points[(i + 1) % n]);
    }
    acc as f64 * 0.5
}

/// Unsigned area enclosed by the polygon.
#[inline]
pub fn polygon_area(points: &[Point2<i32>]) -> f64 {
    signed_area(points).abs()
}

/// Total edge length. `closed` adds the segment from the last vertex back to the first.
pub fn arc_length(points: &[Point2<i32>], closed: bool) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut len = 0.0;
    for w in points.windows(2) {
        len += edge_length(w[0], w[1]);
    }
    if closed {
        len += edge_length(points[points.len() - 1], points[0]);
    }
    len
}

#[inline]
fn edge_length(a: Point2<i32>, b: Point2<i32>) -> f64 {
    ((b.x - a.x) as f64).hypot((b.y - a.y) as f64)
}

pub fn polygon_moments(points: &[Point2<i32>]) -> PolygonMoments {
    let n = points.len();
    if n < 3 {
        return PolygonMoments::default();
    }
    let mut m = PolygonMoments::default();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = cross(a, b) as f64;
        m.m00 += c;
        m.m10 += (a.x + b.x) as f64 * c;
        m.m01 += (a.y + b.y) as f64 * c;
    }
    m.m00 *= 0.5;
    m.m10 /= 6.0;
    m.m01 /= 6.0;
    m
}

/// Area centroid of the polygon.
///
/// Degenerate polygons (zero enclosed area: lines, single points) fall back
/// to the mean of their vertices. Returns `None` only for an empty slice.
pub fn centroid(points: &[Point2<i32>]) -> Option<Point2<f64>> {
    if points.is_empty() {
        return None;
    }
    let m = polygon_moments(points);
    if m.m00.abs() > f64::EPSILON {
        return Some(Point2::new(m.m10 / m.m00, m.m01 / m.m00));
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    Some(Point2::new(sx / n, sy / n))
}

/// [`centroid`] rounded to the nearest pixel.
///
/// This is the single centroid convention used both when a leaf is first
/// measured and when its label is redrawn later.
pub fn pixel_centroid(points: &[Point2<i32>]) -> Option<Point2<i32>> {
    centroid(points).map(|c| Point2::new(c.x.round() as i32, c.y.round() as i32))
}

/// Rounds of the farthest-point walk used to pick the initial split pair.
const SPLIT_SEARCH_ROUNDS: usize = 3;

/// Closed-curve Douglas-Peucker approximation.
///
/// The ring is first split between two mutually distant vertices, found by
/// repeatedly jumping to the vertex farthest from the current one. Both
/// split vertices are then extreme points of the shape, so the arbitrary
/// start of the traced ring (often partway along an edge) never survives
/// as a vertex by itself. Each half is simplified as an open chain;
/// vertices closer than `epsilon` to the chord of their span are dropped.
pub fn approximate_polygon(points: &[Point2<i32>], epsilon: f64) -> Vec<Point2<i32>> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let mut start = 0;
    let mut far = farthest_from(points, start);
    if far == start {
        return vec![points[0]];
    }
    for _ in 0..SPLIT_SEARCH_ROUNDS {
        let next = farthest_from(points, far);
        if next == start {
            break;
        }
        start = far;
        far = next;
    }

    let ring: Vec<Point2<i32>> = points[start..].iter().chain(&points[..start]).copied().collect();
    let split = (far + n - start) % n;

    let mut tail: Vec<Point2<i32>> = ring[split..].to_vec();
    tail.push(ring[0]);

    let mut out = simplify_open(&ring[..=split], epsilon);
    out.pop();
    let mut rest = simplify_open(&tail, epsilon);
    rest.pop();
    out.extend(rest);
    out
}

/// Index of the vertex farthest from `points[from]`; the first one wins ties.
fn farthest_from(points: &[Point2<i32>], from: usize) -> usize {
    let origin = points[from];
    let mut far = from;
    let mut far_d2 = 0i64;
    for (i, p) in points.iter().enumerate() {
        let dx = (p.x - origin.x) as i64;
        let dy = (p.y - origin.y) as i64;
        let d2 = dx * dx + dy * dy;
        if d2 > far_d2 {
            far_d2 = d2;
            far = i;
        }
    }
    far
}

fn simplify_open(chain: &[Point2<i32>], epsilon: f64) -> Vec<Point2<i32>> {
    let n = chain.len();
    if n <= 2 {
        return chain.to_vec();
    }
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let mut best = lo;
        let mut best_d = -1.0;
        for (k, &p) in chain.iter().enumerate().take(hi).skip(lo + 1) {
            let d = distance_to_line(p, chain[lo], chain[hi]);
            if d > best_d {
                best_d = d;
                best = k;
            }
        }
        if best_d > epsilon {
            keep[best] = true;
            stack.push((lo, best));
            stack.push((best, hi));
        }
    }

    chain
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

fn distance_to_line(p: Point2<i32>, a: Point2<i32>, b: Point2<i32>) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let px = (p.x - a.x) as f64;
    let py = (p.y - a.y) as f64;
    let len = dx.hypot(dy);
    if len <= f64::EPSILON {
        return px.hypot(py);
    }
    (px * dy - py * dx).abs() / len
}

/// `true` if every turn of the closed polygon has the same orientation.
///
/// Collinear vertices are tolerated; a polygon with no turn at all is not convex.
pub fn is_convex(polygon: &[Point2<i32>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0i64;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let c = polygon[(i + 2) % n];
        let turn = (b.x - a.x) as i64 * (c.y - b.y) as i64 - (b.y - a.y) as i64 * (c.x - b.x) as i64;
        if turn == 0 {
            continue;
        }
        let s = turn.signum();
        if sign == 0 {
            sign = s;
        } else if s != sign {
            return false;
        }
    }
    sign != 0
}

/// Cosine of the angle at `vertex` between the rays towards `a` and `b`.
pub fn corner_cosine(a: Point2<i32>, b: Point2<i32>, vertex: Point2<i32>) -> f64 {
    let dx1 = (a.x - vertex.x) as f64;
    let dy1 = (a.y - vertex.y) as f64;
    let dx2 = (b.x - vertex.x) as f64;
    let dy2 = (b.y - vertex.y) as f64;
    let denom = ((dx1 * dx1 + dy1 * dy1) * (dx2 * dx2 + dy2 * dy2)).sqrt() + 1e-10;
    (dx1 * dx2 + dy1 * dy2) / denom
}

/// Largest `|cos|` over every corner of the closed polygon (wrapping).
///
/// Near zero means all corners are close to right angles.
pub fn max_corner_cosine(polygon: &[Point2<i32>]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 1.0;
    }
    (0..n)
        .map(|i| {
            let prev = polygon[(i + n - 1) % n];
            let next = polygon[(i + 1) % n];
            corner_cosine(prev, next, polygon[i]).abs()
        })
        .fold(0.0, f64::max)
}
