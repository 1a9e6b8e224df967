use serde::{Deserialize, Serialize};

use crate::annotate::{
    AnnotationStyle, MAX_LABEL_OUTLINE_PX, MAX_LABEL_PX, MAX_MARKER_RADIUS_PX, MAX_STROKE_PX,
};
use crate::error::ParamsError;

/// Binary segmentation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationParams {
    /// Dark objects on light paper become foreground. Set `false` for light
    /// objects photographed on a dark mat.
    pub invert: bool,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self { invert: true }
    }
}

/// Which borders the contour stage keeps.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContourRetrieval {
    /// Every border, hole borders included, no nesting information.
    #[default]
    List,
    /// Only outer borders of top-level blobs.
    External,
}

/// How traced border chains are stored.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainApproximation {
    /// Every border pixel.
    None,
    /// Interior points of straight unit-step runs dropped.
    #[default]
    Simple,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourParams {
    pub retrieval: ContourRetrieval,
    pub approximation: ChainApproximation,
}

/// Reference-square vs. leaf classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Contours with pixel area at or below this are noise.
    pub min_area: f64,
    /// Contours with pixel area at or above this are background.
    pub max_area: f64,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f64,
    /// A quadrilateral is a square candidate when every corner has
    /// `|cos| < max_corner_cosine`.
    pub max_corner_cosine: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            min_area: 1000.0,
            max_area: 1e10,
            approx_epsilon_frac: 0.02,
            max_corner_cosine: 0.3,
        }
    }
}

/// How leaf width and length are measured in pixel space.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionMethod {
    /// Sides of the minimum-area rotated rectangle.
    #[default]
    MinAreaRect,
    /// Extents along the principal axes of the contour points. Contours
    /// with fewer than 5 points use the rotated rectangle instead.
    PrincipalAxes,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementParams {
    pub dimensions: DimensionMethod,
}

/// Full configuration of a [`crate::LeafAnalyzer`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafAnalyzerParams {
    pub segmentation: SegmentationParams,
    pub contours: ContourParams,
    pub classifier: ClassifierParams,
    pub measurement: MeasurementParams,
    pub annotation: AnnotationStyle,
}

impl LeafAnalyzerParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        let c = &self.classifier;
        if !(c.min_area >= 0.0 && c.min_area < c.max_area) {
            return Err(ParamsError::AreaBounds {
                min_area: c.min_area,
                max_area: c.max_area,
            });
        }
        if !c.approx_epsilon_frac.is_finite() || c.approx_epsilon_frac <= 0.0 {
            return Err(ParamsError::ApproxFraction(c.approx_epsilon_frac));
        }
        if !(c.max_corner_cosine > 0.0 && c.max_corner_cosine <= 1.0) {
            return Err(ParamsError::CornerCosine(c.max_corner_cosine));
        }
        let a = &self.annotation;
        if a.reference_thickness == 0 || a.leaf_thickness == 0 {
            return Err(ParamsError::ZeroStroke);
        }
        if !(a.label_px > 0.0 && a.label_px <= MAX_LABEL_PX) {
            return Err(ParamsError::LabelSize {
                value: a.label_px,
                max: MAX_LABEL_PX,
            });
        }
        for (field, value, max) in [
            ("reference_thickness", a.reference_thickness, MAX_STROKE_PX),
            ("leaf_thickness", a.leaf_thickness, MAX_STROKE_PX),
            ("label_outline_px", a.label_outline_px, MAX_LABEL_OUTLINE_PX),
            ("marker_radius", a.marker_radius, MAX_MARKER_RADIUS_PX),
        ] {
            if value > max {
                return Err(ParamsError::AnnotationTooLarge { field, value, max });
            }
        }
        Ok(())
    }
}
