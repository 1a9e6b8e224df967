use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, AggregatedMetrics};
use crate::calibration::CalibrationFactors;
use crate::error::AnalysisError;
use crate::measure::{LeafMetric, LeafTag};

/// Version of the serialized [`AnalysisResult`] layout.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything one analysis run hands back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub schema_version: u32,
    /// Scale used for the run; `None` when the run failed.
    pub calibration: Option<CalibrationFactors>,
    pub leaf_count: usize,
    pub leaves: Vec<LeafMetric>,
    pub aggregates: AggregatedMetrics,
    /// PNG-encoded annotated raster.
    #[serde(skip)]
    pub annotated_image: Option<Vec<u8>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Result for a successful run; aggregates are computed here.
    pub fn new(calibration: CalibrationFactors, leaves: Vec<LeafMetric>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            calibration: Some(calibration),
            leaf_count: leaves.len(),
            aggregates: aggregate(&leaves),
            leaves,
            annotated_image: None,
            error: None,
        }
    }

    /// Error-only result: no leaves, zeroed aggregates, no image.
    pub fn from_error(err: &AnalysisError) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            calibration: None,
            leaf_count: 0,
            leaves: Vec::new(),
            aggregates: AggregatedMetrics::default(),
            annotated_image: None,
            error: Some(err.to_string()),
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn leaf(&self, id: u32) -> Option<&LeafMetric> {
        self.leaves.iter().find(|l| l.id == id)
    }

    /// Drop leaves by current id, then renumber and recompute aggregates.
    ///
    /// Unknown ids are ignored. Returns how many leaves were removed. The
    /// annotated image is left untouched; see
    /// [`crate::LeafAnalyzer::remove_leaves`] for the full flow.
    pub fn remove_leaves(&mut self, ids: &[u32]) -> usize {
        self.retain(|l| !ids.contains(&l.id))
    }

    /// Same as [`AnalysisResult::remove_leaves`], keyed by stable tag.
    pub fn remove_leaves_by_tag(&mut self, tags: &[LeafTag]) -> usize {
        self.retain(|l| !tags.contains(&l.tag))
    }

    fn retain(&mut self, keep: impl FnMut(&LeafMetric) -> bool) -> usize {
        let before = self.leaves.len();
        self.leaves.retain(keep);
        let removed = before - self.leaves.len();
        if removed > 0 {
            self.refresh();
        }
        removed
    }

    /// Dense 1..N ids in current order, then a full aggregate recompute.
    pub fn refresh(&mut self) {
        for (i, leaf) in self.leaves.iter_mut().enumerate() {
            leaf.id = i as u32 + 1;
        }
        self.leaf_count = self.leaves.len();
        self.aggregates = aggregate(&self.leaves);
    }
}
