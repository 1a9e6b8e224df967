//! Reference-square vs. leaf classification of traced contours.

use leafscan_core::{approximate_polygon, is_convex, max_corner_cosine};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::contours::Contour;
use crate::params::ClassifierParams;

/// Outcome of classifying a single contour.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ShapeKind {
    /// Outside the area bounds.
    Rejected,
    /// Flat convex quadrilateral with near-right corners.
    Square,
    Leaf,
}

/// Run-scoped working sets built by one classification pass.
///
/// Both keep extraction order.
#[derive(Clone, Debug, Default)]
pub struct Classified {
    pub squares: Vec<Contour>,
    pub leaves: Vec<Contour>,
}

impl Classified {
    /// Contours that passed the area bounds.
    pub fn candidates(&self) -> usize {
        self.squares.len() + self.leaves.len()
    }
}

/// Decide what one contour is.
pub fn classify_contour(contour: &Contour, params: &ClassifierParams) -> ShapeKind {
    let area = contour.area();
    if !(area > params.min_area && area < params.max_area) {
        return ShapeKind::Rejected;
    }

    let epsilon = contour.perimeter() * params.approx_epsilon_frac;
    let approx = approximate_polygon(&contour.points, epsilon);
    if approx.len() == 4
        && is_convex(&approx)
        && max_corner_cosine(&approx) < params.max_corner_cosine
    {
        ShapeKind::Square
    } else {
        ShapeKind::Leaf
    }
}

/// Split contours into square candidates and leaves, dropping the rest.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(contours, params), fields(contours = contours.len()))
)]
pub fn classify(contours: Vec<Contour>, params: &ClassifierParams) -> Classified {
    let total = contours.len();
    let mut out = Classified::default();
    for contour in contours {
        match classify_contour(&contour, params) {
            ShapeKind::Square => out.squares.push(contour),
            ShapeKind::Leaf => out.leaves.push(contour),
            ShapeKind::Rejected => {}
        }
    }
    log::debug!(
        "classified {} contours: {} squares, {} leaves, {} rejected",
        total,
        out.squares.len(),
        out.leaves.len(),
        total - out.candidates()
    );
    out
}
