use image::error::{ImageFormatHint, UnsupportedErrorKind};
use image::{ImageError, RgbaImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::annotate::{annotate, encode_png, rerender};
use crate::calibration::{calibrate, validate_reference_area};
use crate::classify::classify;
use crate::contours::extract_contours;
use crate::error::{AnalysisError, ParamsError};
use crate::measure::{measure_leaves, LeafMetric};
use crate::params::LeafAnalyzerParams;
use crate::result::AnalysisResult;
use crate::segmentation::segment;

/// Leaf measurement pipeline with a fixed configuration.
///
/// The analyzer holds no per-run state; one instance can serve any number
/// of runs, from any number of threads.
#[derive(Clone, Debug, Default)]
pub struct LeafAnalyzer {
    params: LeafAnalyzerParams,
}

impl LeafAnalyzer {
    /// Validate `params` and build an analyzer.
    pub fn new(params: LeafAnalyzerParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &LeafAnalyzerParams {
        &self.params
    }

    /// Run the full pipeline on a decoded raster.
    ///
    /// `reference_area` is the real area of the reference square in the
    /// caller's unit squared; it is checked before any image work starts.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width(), height = image.height()))
    )]
    pub fn analyze(
        &self,
        image: &RgbaImage,
        reference_area: f64,
    ) -> Result<AnalysisResult, AnalysisError> {
        validate_reference_area(reference_area)?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AnalysisError::EmptyImage { width, height });
        }

        let mask = segment(image, &self.params.segmentation);
        let contours = extract_contours(&mask, &self.params.contours);
        let classified = classify(contours, &self.params.classifier);
        let (ref_idx, factors) = calibrate(
            &classified.squares,
            reference_area,
            classified.candidates(),
        )?;

        let leaves = measure_leaves(&classified.leaves, &factors, &self.params.measurement);
        let mut result = AnalysisResult::new(factors, leaves);

        let annotated = annotate(
            image,
            classified.squares.get(ref_idx),
            &result.leaves,
            &self.params.annotation,
        );
        match encode_png(&annotated) {
            Ok(png) => result.annotated_image = Some(png),
            Err(err) => log::warn!("annotated image dropped: {err}"),
        }

        log::info!(
            "{}x{}: {} leaves, total area {:.4}, {:.6} units/px",
            width,
            height,
            result.leaf_count,
            result.aggregates.total_area,
            factors.linear
        );
        Ok(result)
    }

    /// Decode encoded image bytes, then [`LeafAnalyzer::analyze`].
    pub fn analyze_bytes(
        &self,
        bytes: &[u8],
        reference_area: f64,
    ) -> Result<AnalysisResult, AnalysisError> {
        validate_reference_area(reference_area)?;
        let image = decode_image(bytes)?;
        self.analyze(&image, reference_area)
    }

    /// Annotate stored leaves on the original raster without re-detecting.
    pub fn rerender(&self, source: &RgbaImage, leaves: &[LeafMetric]) -> RgbaImage {
        rerender(source, leaves, &self.params.annotation)
    }

    /// Delete leaves by current id and bring the whole result up to date:
    /// dense renumbering, fresh aggregates and a re-rendered annotated image.
    ///
    /// Returns the number of leaves removed.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, result, source), fields(leaves = result.leaves.len()))
    )]
    pub fn remove_leaves(
        &self,
        result: &mut AnalysisResult,
        source: &RgbaImage,
        ids: &[u32],
    ) -> usize {
        let removed = result.remove_leaves(ids);
        if removed == 0 {
            return 0;
        }
        let annotated = self.rerender(source, &result.leaves);
        result.annotated_image = match encode_png(&annotated) {
            Ok(png) => Some(png),
            Err(err) => {
                log::warn!("annotated image dropped: {err}");
                None
            }
        };
        log::info!("removed {} leaves, {} remain", removed, result.leaf_count);
        removed
    }
}

/// Decode caller bytes into an RGBA raster.
///
/// A recognised format whose codec is not compiled in is reported as
/// [`AnalysisError::RuntimeUnavailable`]; every other decoder failure is
/// [`AnalysisError::ImageDecodeFailure`].
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, AnalysisError> {
    let decoded = image::load_from_memory(bytes).map_err(decode_error)?;
    let image = decoded.to_rgba8();
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(AnalysisError::EmptyImage { width, height });
    }
    Ok(image)
}

fn decode_error(err: ImageError) -> AnalysisError {
    if let ImageError::Unsupported(u) = &err {
        if let UnsupportedErrorKind::Format(ImageFormatHint::Exact(format)) = u.kind() {
            return AnalysisError::RuntimeUnavailable(format!("no {format:?} decoder in this build"));
        }
    }
    AnalysisError::ImageDecodeFailure(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::ImageDecodeFailure(_)), "{err:?}");
    }

    #[test]
    fn missing_codec_is_runtime_unavailable() {
        use image::error::UnsupportedError;
        use image::ImageFormat;

        let hint = ImageFormatHint::Exact(ImageFormat::Avif);
        let err = decode_error(ImageError::Unsupported(UnsupportedError::from_format_and_kind(
            hint.clone(),
            UnsupportedErrorKind::Format(hint),
        )));
        assert!(matches!(err, AnalysisError::RuntimeUnavailable(ref msg) if msg.contains("Avif")), "{err:?}");
        assert!(!err.is_image_problem());
    }

    #[test]
    fn unsupported_feature_is_a_decode_failure() {
        use image::error::UnsupportedError;

        let err = decode_error(ImageError::Unsupported(UnsupportedError::from_format_and_kind(
            ImageFormatHint::Unknown,
            UnsupportedErrorKind::GenericFeature("interlacing".into()),
        )));
        assert!(matches!(err, AnalysisError::ImageDecodeFailure(_)), "{err:?}");
        assert!(err.is_image_problem());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let mut params = LeafAnalyzerParams::default();
        params.annotation.leaf_thickness = 0;
        assert_eq!(LeafAnalyzer::new(params).unwrap_err(), ParamsError::ZeroStroke);
    }

    #[test]
    fn reference_area_is_checked_before_decoding() {
        let err = LeafAnalyzer::default().analyze_bytes(b"junk", -2.0).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidCalibrationInput { .. }));
    }

    #[test]
    fn empty_raster() {
        let err = LeafAnalyzer::default()
            .analyze(&RgbaImage::new(0, 0), 1.0)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyImage { width: 0, height: 0 }));
    }
}
