//! Principal-axis extents of a point cloud.

use nalgebra::{Matrix2, Point2, SymmetricEigen, Vector2};
use serde::{Deserialize, Serialize};

/// Extents of a point set along its principal axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisExtents {
    pub mean: Point2<f64>,
    /// Unit direction of largest variance.
    pub major_axis: Vector2<f64>,
    /// Extent along `major_axis` (max - min of the projections).
    pub major: f64,
    /// Extent along the perpendicular axis.
    pub minor: f64,
}

/// Project the points onto the eigenvectors of their covariance and
/// measure the span along each.
///
/// Returns `None` for fewer than two points.
pub fn principal_extents(points: &[Point2<i32>]) -> Option<AxisExtents> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    let mean = Point2::new(sx / n, sy / n);

    let mut cov = Matrix2::<f64>::zeros();
    for p in points {
        let d = Vector2::new(p.x as f64 - mean.x, p.y as f64 - mean.y);
        cov += d * d.transpose();
    }
    cov /= n;

    let eig = SymmetricEigen::new(cov);
    let (major_idx, minor_idx) = if eig.eigenvalues[0] >= eig.eigenvalues[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    let major_axis: Vector2<f64> = eig.eigenvectors.column(major_idx).into_owned();
    let minor_axis: Vector2<f64> = eig.eigenvectors.column(minor_idx).into_owned();

    let span = |axis: &Vector2<f64>| {
        let (lo, hi) = points.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), p| {
                let t = (p.x as f64 - mean.x) * axis.x + (p.y as f64 - mean.y) * axis.y;
                (lo.min(t), hi.max(t))
            },
        );
        hi - lo
    };

    let a = span(&major_axis);
    let b = span(&minor_axis);
    Some(AxisExtents {
        mean,
        major_axis,
        major: a.max(b),
        minor: a.min(b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn horizontal_bar() {
        let mut pts = Vec::new();
        for x in 0..=80 {
            pts.push(Point2::new(x, 0));
            pts.push(Point2::new(x, 10));
        }
        let ext = principal_extents(&pts).expect("extents");
        assert_abs_diff_eq!(ext.major, 80.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ext.minor, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ext.major_axis.x.abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn too_few_points() {
        assert!(principal_extents(&[Point2::new(1, 1)]).is_none());
    }
}
