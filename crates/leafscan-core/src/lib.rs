//! Core geometry and logging utilities for leaf measurement.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any raster type: everything here works on integer contour
//! vertices (`nalgebra::Point2<i32>`) as produced by border following.
//!
//! - [`polygon`]: shoelace area, arc length, moments and centroid,
//!   closed Douglas-Peucker approximation, convexity and corner tests.
//! - [`hull`]: convex hull and the minimum-area rotated rectangle.
//! - [`axes`]: principal-axis extents of a point set.

pub mod axes;
pub mod hull;
mod logger;
pub mod polygon;

pub use axes::{principal_extents, AxisExtents};
pub use hull::{convex_hull, min_area_rect, RotatedRect};
pub use polygon::{
    approximate_polygon, arc_length, centroid, corner_cosine, is_convex, max_corner_cosine,
    pixel_centroid, polygon_area, polygon_moments, signed_area, PolygonMoments,
};

#[cfg(feature = "tracing")]
pub use logger::{init_tracing, DEFAULT_TRACING_FILTER};

pub use logger::init_with_level;
