//! Contains the final aggregation tree.
//! This tree is computed from [`InternalAggregations`](super::intermediate_agg_result::InternalAggregations)
//! once all partial results are merged. For example: The intermediate result contains
//! intermediate average results, which is the sum and the number of values. The actual average is
//! calculated on the step from intermediate to final aggregation result tree.

use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::metric::{SingleMetricResult, Stats};

#[derive(Clone, Default, Debug, PartialEq, Serialize)]
/// The final aggegation result.
pub struct AggregationResults(pub FxHashMap<String, AggregationResult>);

impl AggregationResults {
    /// Returns the result named `name`.
    pub fn get(&self, name: &str) -> Option<&AggregationResult> {
        self.0.get(name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
/// An aggregation is either a bucket or a metric.
pub enum AggregationResult {
    /// Bucket result variant.
    BucketResult(BucketResult),
    /// Metric result variant.
    MetricResult(MetricResult),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
/// MetricResult
pub enum MetricResult {
    /// Average metric result.
    Average(SingleMetricResult),
    /// Count metric result.
    Count(SingleMetricResult),
    /// Max metric result.
    Max(SingleMetricResult),
    /// Min metric result.
    Min(SingleMetricResult),
    /// Stats metric result.
    Stats(Stats),
    /// Sum metric result.
    Sum(SingleMetricResult),
}

/// BucketEntry holds bucket aggregation result types.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BucketResult {
    /// This is the histogram entry for a bucket, which contains a key, count, and optionally
    /// sub_aggregations.
    Histogram {
        /// The buckets.
        ///
        /// If there are holes depends on the request, if min_doc_count is 0, then there are no
        /// holes between the first and last bucket.
        buckets: BucketEntries,
    },
}

/// The buckets of a histogram, as a list or as an object keyed by bucket key.
///
/// The keyed variant keeps the order of the buckets in the serialized object.
#[derive(Clone, Debug, PartialEq)]
pub enum BucketEntries {
    /// Vector format bucket entries
    Vec(Vec<BucketEntry>),
    /// Keyed format bucket entries
    Keyed(Vec<BucketEntry>),
}

impl BucketEntries {
    /// The bucket entries, in their final order.
    pub fn entries(&self) -> &[BucketEntry] {
        match self {
            BucketEntries::Vec(entries) | BucketEntries::Keyed(entries) => entries,
        }
    }
}

impl Serialize for BucketEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BucketEntries::Vec(entries) => entries.serialize(serializer),
            BucketEntries::Keyed(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for entry in entries {
                    map.serialize_entry(&entry.map_key(), entry)?;
                }
                map.end()
            }
        }
    }
}

/// This is the default entry for a bucket, which contains a key, count, and optionally
/// sub_aggregations.
///
/// # JSON Format
/// ```json
/// {
///   ...
///     "my_histogram": {
///       "buckets": [
///         {
///           "key": 2,
///           "doc_count": 5
///         },
///         {
///           "key": 4,
///           "doc_count": 2
///         }
///       ]
///    }
///    ...
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BucketEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// The string representation of the bucket.
    pub key_as_string: Option<String>,
    /// The identifier of the bucket.
    pub key: i64,
    /// Number of documents in the bucket.
    pub doc_count: u64,
    #[serde(flatten)]
    /// Sub-aggregations in this bucket.
    pub sub_aggregation: AggregationResults,
}

impl BucketEntry {
    fn map_key(&self) -> String {
        self.key_as_string
            .clone()
            .unwrap_or_else(|| self.key.to_string())
    }
}
