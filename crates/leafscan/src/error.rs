/// Terminal failures of an analysis run.
///
/// Any of these aborts the run; no partial leaves or aggregates are
/// produced. [`crate::AnalysisResult::from_error`] turns one into the flat
/// error-only result shape.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("no reference square found ({candidates} contours inside the area bounds)")]
    MissingReferenceObject { candidates: usize },

    #[error("reference area must be a positive finite number (got {reference_area})")]
    InvalidCalibrationInput { reference_area: f64 },

    #[error("failed to decode input image")]
    ImageDecodeFailure(#[source] image::ImageError),

    #[error("input image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("vision runtime unavailable: {0}")]
    RuntimeUnavailable(String),
}

impl AnalysisError {
    /// `true` when the failure depends on the photo itself rather than on
    /// how this build or the caller is set up.
    pub fn is_image_problem(&self) -> bool {
        matches!(
            self,
            Self::MissingReferenceObject { .. } | Self::ImageDecodeFailure(_) | Self::EmptyImage { .. }
        )
    }
}

/// Recoverable drawing failures. The annotator logs these and degrades to
/// label-only output; they never abort a run.
#[derive(thiserror::Error, Debug)]
pub enum AnnotationError {
    #[error("contour snapshot is empty")]
    EmptySnapshot,

    #[error("contour snapshot has odd length {len}")]
    OddSnapshotLength { len: usize },

    #[error("contour snapshot has {points} points, need at least 3")]
    TooFewPoints { points: usize },

    #[error("failed to encode annotated image")]
    Encode(#[source] image::ImageError),
}

/// Rejected analyzer configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("area bounds must satisfy 0 <= min_area < max_area (got {min_area}..{max_area})")]
    AreaBounds { min_area: f64, max_area: f64 },

    #[error("approximation fraction must be positive and finite (got {0})")]
    ApproxFraction(f64),

    #[error("corner cosine bound must lie in (0, 1] (got {0})")]
    CornerCosine(f64),

    #[error("stroke thickness must be non-zero")]
    ZeroStroke,

    #[error("label size must be a finite pixel height in (0, {max}] (got {value})")]
    LabelSize { value: f32, max: f32 },

    #[error("annotation {field} of {value} px exceeds the {max} px limit")]
    AnnotationTooLarge {
        field: &'static str,
        value: u32,
        max: u32,
    },
}
