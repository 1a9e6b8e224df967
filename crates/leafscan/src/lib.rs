//! Leaf measurement from a photo containing a reference square.
//!
//! The pipeline runs in fixed stages, each consuming the previous one's
//! output:
//! - [`segmentation`]: grayscale + Otsu binarization,
//! - [`contours`]: border following on the mask,
//! - [`classify`]: reference square candidates vs. leaves,
//! - [`calibration`]: pixel-to-real scale from the largest square,
//! - [`measure`]: per-leaf area, perimeter, width, length, centroid,
//! - [`aggregate`]: sums, means and population standard deviations,
//! - [`annotate`]: overlay drawing, including re-rendering stored leaves.
//!
//! [`LeafAnalyzer`] wires the stages together. Pure geometry lives in
//! `leafscan-core`, re-exported here as [`geometry`].
//!
//! ```no_run
//! use leafscan::LeafAnalyzer;
//!
//! let bytes = std::fs::read("leaves.jpg").unwrap();
//! let result = LeafAnalyzer::default().analyze_bytes(&bytes, 4.0).unwrap();
//! for leaf in &result.leaves {
//!     println!("#{} {:.2} cm2, {:.2} x {:.2} cm", leaf.id, leaf.area, leaf.length, leaf.width);
//! }
//! ```

pub mod aggregate;
pub mod annotate;
pub mod calibration;
pub mod classify;
pub mod contours;
mod error;
pub mod io;
mod label;
pub mod measure;
mod params;
mod pipeline;
mod result;
pub mod segmentation;

pub use leafscan_core as geometry;

pub use aggregate::{aggregate, AggregatedMetrics};
pub use annotate::{encode_png, AnnotationStyle};
pub use calibration::CalibrationFactors;
pub use contours::Contour;
pub use error::{AnalysisError, AnnotationError, ParamsError};
pub use io::{AnalysisReport, AnalyzeConfig, IoError};
pub use measure::{LeafMetric, LeafTag};
pub use params::{
    ChainApproximation, ClassifierParams, ContourParams, ContourRetrieval, DimensionMethod,
    LeafAnalyzerParams, MeasurementParams, SegmentationParams,
};
pub use pipeline::{decode_image, LeafAnalyzer};
pub use result::{AnalysisResult, SCHEMA_VERSION};
