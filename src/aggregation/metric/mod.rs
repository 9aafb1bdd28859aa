//! Module for all metric aggregation results.
//!
//! Metrics found as sub-aggregations of histogram buckets. Some of them output a single
//! numeric metric (e.g. Average) and are called single-value numeric metrics, others generate
//! multiple metrics (e.g. Stats) and are called multi-value numeric metrics.
//!
//! All of them are backed by [`IntermediateStats`], which merges losslessly.

mod single_value;
mod stats;

use serde::{Deserialize, Serialize};
pub use single_value::*;
pub use stats::*;

/// Single-metric aggregations use this common result structure.
///
/// Main reason to wrap it in value is to match elasticsearch output structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleMetricResult {
    /// The value of the single value metric.
    pub value: Option<f64>,
}

impl From<f64> for SingleMetricResult {
    fn from(value: f64) -> Self {
        Self { value: Some(value) }
    }
}

impl From<Option<f64>> for SingleMetricResult {
    fn from(value: Option<f64>) -> Self {
        Self { value }
    }
}
