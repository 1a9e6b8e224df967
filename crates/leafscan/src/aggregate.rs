//! Summary statistics over a leaf set.

use serde::{Deserialize, Serialize};

use crate::measure::LeafMetric;

/// Sums, means and population standard deviations of the leaf metrics.
///
/// Every field is zero for an empty leaf set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub total_area: f64,
    pub average_area: f64,
    pub std_dev_area: f64,
    pub average_perimeter: f64,
    pub std_dev_perimeter: f64,
    pub average_width: f64,
    pub std_dev_width: f64,
    pub average_length: f64,
    pub std_dev_length: f64,
    pub average_width_to_length_ratio: f64,
}

/// Mean and population standard deviation (divide by `N`), two-pass.
fn mean_std(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let (n, sum) = values.clone().fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    let var = values.map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    (mean, var.sqrt())
}

/// Recompute every aggregate from scratch.
pub fn aggregate(leaves: &[LeafMetric]) -> AggregatedMetrics {
    if leaves.is_empty() {
        return AggregatedMetrics::default();
    }
    let (average_area, std_dev_area) = mean_std(leaves.iter().map(|l| l.area));
    let (average_perimeter, std_dev_perimeter) = mean_std(leaves.iter().map(|l| l.perimeter));
    let (average_width, std_dev_width) = mean_std(leaves.iter().map(|l| l.width));
    let (average_length, std_dev_length) = mean_std(leaves.iter().map(|l| l.length));
    let (average_width_to_length_ratio, _) =
        mean_std(leaves.iter().map(|l| l.width_to_length_ratio));

    AggregatedMetrics {
        total_area: leaves.iter().map(|l| l.area).sum(),
        average_area,
        std_dev_area,
        average_perimeter,
        std_dev_perimeter,
        average_width,
        std_dev_width,
        average_length,
        std_dev_length,
        average_width_to_length_ratio,
    }
}
