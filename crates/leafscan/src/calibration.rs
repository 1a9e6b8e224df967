//! Pixel-to-real-unit scale from the reference square.

use serde::{Deserialize, Serialize};

use crate::contours::Contour;
use crate::error::AnalysisError;

/// Scale factors for one analysis run.
///
/// `linear` comes from the reference perimeter and `areal` from its area.
/// They are derived independently, so `areal` is only approximately
/// `linear * linear` on a non-ideal square.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFactors {
    /// Real length units per pixel.
    pub linear: f64,
    /// Real area units per square pixel.
    pub areal: f64,
}

impl CalibrationFactors {
    /// Factors from the pixel geometry of a reference square of known real area.
    ///
    /// `perimeter / 4` stands in for the side length in pixels.
    pub fn from_reference(real_area: f64, pixel_perimeter: f64, pixel_area: f64) -> Self {
        Self {
            linear: real_area.sqrt() / (pixel_perimeter / 4.0),
            areal: real_area / pixel_area,
        }
    }

    #[inline]
    pub fn length(&self, pixels: f64) -> f64 {
        pixels * self.linear
    }

    #[inline]
    pub fn area(&self, pixels: f64) -> f64 {
        pixels * self.areal
    }
}

/// Reject a reference area that cannot produce finite positive factors.
pub fn validate_reference_area(real_area: f64) -> Result<(), AnalysisError> {
    if real_area.is_finite() && real_area > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidCalibrationInput {
            reference_area: real_area,
        })
    }
}

/// Index of the largest-area square; the first one wins ties.
pub fn select_reference(squares: &[Contour]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, sq) in squares.iter().enumerate() {
        let area = sq.area();
        if best.is_none_or(|(_, a)| area > a) {
            best = Some((i, area));
        }
    }
    best.map(|(i, _)| i)
}

/// Pick the reference square and derive the run's factors.
///
/// `candidates` is only used for the error message.
pub fn calibrate(
    squares: &[Contour],
    real_area: f64,
    candidates: usize,
) -> Result<(usize, CalibrationFactors), AnalysisError> {
    validate_reference_area(real_area)?;
    let idx = select_reference(squares).ok_or(AnalysisError::MissingReferenceObject { candidates })?;
    let reference = &squares[idx];
    let factors =
        CalibrationFactors::from_reference(real_area, reference.perimeter(), reference.area());
    log::debug!(
        "reference square #{} area {:.1}px perimeter {:.1}px -> linear {:.6} areal {:.8}",
        idx,
        reference.area(),
        reference.perimeter(),
        factors.linear,
        factors.areal
    );
    Ok((idx, factors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn square(x0: i32, y0: i32, side: i32) -> Contour {
        Contour::new(vec![
            Point2::new(x0, y0),
            Point2::new(x0 + side, y0),
            Point2::new(x0 + side, y0 + side),
            Point2::new(x0, y0 + side),
        ])
    }

    #[test]
    fn unit_square_of_100px() {
        let (idx, f) = calibrate(&[square(0, 0, 100)], 1.0, 1).expect("calibrate");
        assert_eq!(idx, 0);
        assert_relative_eq!(f.linear, 0.01);
        assert_relative_eq!(f.areal, 0.0001);
    }

    #[test]
    fn doubling_area_scales_factors() {
        let sq = [square(0, 0, 80)];
        let (_, a) = calibrate(&sq, 2.5, 1).expect("calibrate");
        let (_, b) = calibrate(&sq, 5.0, 1).expect("calibrate");
        assert_relative_eq!(b.linear / a.linear, 2f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(b.areal / a.areal, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn largest_square_is_the_reference() {
        let squares = [square(0, 0, 40), square(100, 100, 90), square(300, 0, 60)];
        let (idx, f) = calibrate(&squares, 4.0, 3).expect("calibrate");
        assert_eq!(idx, 1);
        assert_relative_eq!(f.linear, 2.0 / 90.0);
    }

    #[test]
    fn ties_keep_extraction_order() {
        let squares = [square(0, 0, 50), square(200, 0, 50)];
        assert_eq!(select_reference(&squares), Some(0));
    }

    #[test]
    fn missing_reference() {
        let err = calibrate(&[], 1.0, 4).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingReferenceObject { candidates: 4 }));
    }

    #[test]
    fn bad_reference_area() {
        for a in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                calibrate(&[square(0, 0, 10)], a, 1),
                Err(AnalysisError::InvalidCalibrationInput { .. })
            ));
        }
    }
}
