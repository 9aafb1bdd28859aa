//! Contains the intermediate aggregation tree, that can be merged.
//! Intermediate aggregation results are produced per shard and merged on the coordinating node,
//! level after level: the buckets of a histogram are merged by key, and the sub-aggregations
//! of buckets sharing a key are merged by name.

use itertools::Itertools;
use rustc_hash::FxHashMap;

use super::agg_result::{AggregationResult, AggregationResults, MetricResult};
use super::bucket::InternalHistogram;
use super::metric::{
    IntermediateAverage, IntermediateCount, IntermediateMax, IntermediateMin, IntermediateStats,
    IntermediateSum,
};
use super::streams::{AggregationStreams, StreamInput, StreamOutput, Streamable};
use super::{ReduceContext, VecWithNames, get_agg_name_and_property};
use crate::ReduceError;

/// Contains the intermediate aggregation results of one bucket, keyed by aggregation name.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct InternalAggregations(pub(crate) VecWithNames<InternalAggregation>);

impl InternalAggregations {
    /// Builds the tree from `(name, result)` pairs.
    pub fn from_entries(entries: Vec<(String, InternalAggregation)>) -> Self {
        InternalAggregations(VecWithNames::from_entries(entries))
    }

    /// Returns the result named `name`.
    pub fn get(&self, name: &str) -> Option<&InternalAggregation> {
        self.0.get(name)
    }

    /// Iterates over the results, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InternalAggregation)> + '_ {
        self.0.iter()
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the tree holds no result.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges the trees of all buckets sharing one key.
    ///
    /// Results are grouped by name and each group is reduced by its own kind. A tree reduced
    /// alone is still passed through the reduction, so that nested histograms get their final
    /// shape.
    pub fn reduce(
        aggregations: Vec<InternalAggregations>,
        ctx: &ReduceContext,
    ) -> crate::Result<InternalAggregations> {
        let num_trees = aggregations.len();
        let mut grouped: FxHashMap<String, Vec<InternalAggregation>> = FxHashMap::default();
        for tree in aggregations {
            for (name, aggregation) in tree.0.into_entries() {
                grouped
                    .entry(name)
                    .or_insert_with(|| Vec::with_capacity(num_trees))
                    .push(aggregation);
            }
        }
        let entries = grouped
            .into_iter()
            .map(|(name, group)| Ok((name, InternalAggregation::reduce(group, ctx)?)))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(InternalAggregations::from_entries(entries))
    }

    /// Looks up the value an ordering path points to, e.g. `avg` or `stats.max`.
    pub(crate) fn get_value_from_aggregation(
        &self,
        name: &str,
        agg_property: &str,
    ) -> crate::Result<Option<f64>> {
        if let Some(aggregation) = self.get(name) {
            aggregation.get_value(agg_property)
        } else {
            Err(ReduceError::InvalidArgument(format!(
                "Could not find aggregation with name {name} in metric sub_aggregations"
            )))
        }
    }

    /// Looks up the value of an ordering path like `stats.max`.
    pub fn get_value(&self, path: &str) -> crate::Result<Option<f64>> {
        let (agg_name, agg_property) = get_agg_name_and_property(path);
        self.get_value_from_aggregation(agg_name, agg_property)
    }

    /// Convert intermediate result and its aggregation request to the final result.
    pub fn into_final_result(self) -> crate::Result<AggregationResults> {
        let results = self
            .0
            .into_entries()
            .map(|(name, aggregation)| Ok((name, aggregation.into_final_result()?)))
            .collect::<crate::Result<_>>()?;
        Ok(AggregationResults(results))
    }
}

impl Streamable for InternalAggregations {
    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()> {
        output.write_vint(self.len() as u64)?;
        for (name, aggregation) in self.iter() {
            output.write_str(name)?;
            output.write_str(aggregation.type_tag())?;
            aggregation.write_to(output)?;
        }
        Ok(())
    }

    fn read_from(input: &mut StreamInput<'_>) -> crate::Result<Self> {
        let len = input.read_len()?;
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            let name = input.read_string()?;
            let type_tag = input.read_string()?;
            let aggregation = input.read_aggregation(&type_tag)?;
            entries.push((name, aggregation));
        }
        if let Some(name) = entries.iter().map(|(name, _)| name).duplicates().next() {
            return Err(ReduceError::ProtocolError(format!(
                "duplicate aggregation name [{name}]"
            )));
        }
        Ok(InternalAggregations::from_entries(entries))
    }
}

/// An aggregation is either a bucket or a metric.
#[derive(Clone, Debug, PartialEq)]
pub enum InternalAggregation {
    /// Histogram bucket aggregation.
    Histogram(InternalHistogram),
    /// Metric variant
    Metric(InternalMetricResult),
}

impl From<InternalHistogram> for InternalAggregation {
    fn from(histogram: InternalHistogram) -> Self {
        InternalAggregation::Histogram(histogram)
    }
}

impl From<InternalMetricResult> for InternalAggregation {
    fn from(metric: InternalMetricResult) -> Self {
        InternalAggregation::Metric(metric)
    }
}

impl InternalAggregation {
    /// Registers the read functions of all aggregation kinds.
    pub fn register_streams(streams: &mut AggregationStreams) {
        streams.register(InternalHistogram::TYPE, read_histogram);
        streams.register(InternalMetricResult::AVG, read_average);
        streams.register(InternalMetricResult::VALUE_COUNT, read_count);
        streams.register(InternalMetricResult::MAX, read_max);
        streams.register(InternalMetricResult::MIN, read_min);
        streams.register(InternalMetricResult::STATS, read_stats);
        streams.register(InternalMetricResult::SUM, read_sum);
    }

    /// Type tag written in front of the result on the wire.
    pub fn type_tag(&self) -> &'static str {
        match self {
            InternalAggregation::Histogram(_) => InternalHistogram::TYPE,
            InternalAggregation::Metric(metric) => metric.type_tag(),
        }
    }

    /// Merges results of the same name and kind.
    pub fn reduce(
        aggregations: Vec<InternalAggregation>,
        ctx: &ReduceContext,
    ) -> crate::Result<InternalAggregation> {
        let mut aggregations = aggregations.into_iter();
        let first = aggregations.next().ok_or_else(|| {
            ReduceError::InvalidArgument("no aggregation result to reduce".to_string())
        })?;
        match first {
            InternalAggregation::Histogram(histogram) => {
                let mut histograms = Vec::with_capacity(aggregations.len() + 1);
                histograms.push(histogram);
                for aggregation in aggregations {
                    match aggregation {
                        InternalAggregation::Histogram(histogram) => histograms.push(histogram),
                        other => {
                            return Err(incompatible_types(InternalHistogram::TYPE, &other));
                        }
                    }
                }
                InternalHistogram::reduce(histograms, ctx).map(InternalAggregation::Histogram)
            }
            InternalAggregation::Metric(mut metric) => {
                for aggregation in aggregations {
                    match aggregation {
                        InternalAggregation::Metric(other) => metric.merge_fruits(other)?,
                        other => return Err(incompatible_types(metric.type_tag(), &other)),
                    }
                }
                Ok(InternalAggregation::Metric(metric))
            }
        }
    }

    pub(crate) fn get_value(&self, agg_property: &str) -> crate::Result<Option<f64>> {
        match self {
            InternalAggregation::Histogram(histogram) => Err(ReduceError::InvalidArgument(
                format!(
                    "Ordering path must point to a metric aggregation, [{}] is a histogram",
                    histogram.name()
                ),
            )),
            InternalAggregation::Metric(metric) => metric.get_value(agg_property),
        }
    }

    fn into_final_result(self) -> crate::Result<AggregationResult> {
        match self {
            InternalAggregation::Histogram(histogram) => {
                Ok(AggregationResult::BucketResult(histogram.into_final_result()?))
            }
            InternalAggregation::Metric(metric) => Ok(AggregationResult::MetricResult(
                metric.into_final_metric_result(),
            )),
        }
    }

    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()> {
        match self {
            InternalAggregation::Histogram(histogram) => histogram.write_to(output),
            InternalAggregation::Metric(metric) => metric.stats().write_to(output),
        }
    }
}

fn incompatible_types(expected: &str, got: &InternalAggregation) -> ReduceError {
    ReduceError::InvariantViolation(format!(
        "cannot merge aggregation results of type [{expected}] and [{}]",
        got.type_tag()
    ))
}

fn read_histogram(input: &mut StreamInput<'_>) -> crate::Result<InternalAggregation> {
    InternalHistogram::read_from(input).map(InternalAggregation::Histogram)
}

fn read_average(input: &mut StreamInput<'_>) -> crate::Result<InternalAggregation> {
    let stats = IntermediateStats::read_from(input)?;
    Ok(InternalMetricResult::Average(IntermediateAverage::from_stats(stats)).into())
}

fn read_count(input: &mut StreamInput<'_>) -> crate::Result<InternalAggregation> {
    let stats = IntermediateStats::read_from(input)?;
    Ok(InternalMetricResult::Count(IntermediateCount::from_stats(stats)).into())
}

fn read_max(input: &mut StreamInput<'_>) -> crate::Result<InternalAggregation> {
    let stats = IntermediateStats::read_from(input)?;
    Ok(InternalMetricResult::Max(IntermediateMax::from_stats(stats)).into())
}

fn read_min(input: &mut StreamInput<'_>) -> crate::Result<InternalAggregation> {
    let stats = IntermediateStats::read_from(input)?;
    Ok(InternalMetricResult::Min(IntermediateMin::from_stats(stats)).into())
}

fn read_stats(input: &mut StreamInput<'_>) -> crate::Result<InternalAggregation> {
    let stats = IntermediateStats::read_from(input)?;
    Ok(InternalMetricResult::Stats(stats).into())
}

fn read_sum(input: &mut StreamInput<'_>) -> crate::Result<InternalAggregation> {
    let stats = IntermediateStats::read_from(input)?;
    Ok(InternalMetricResult::Sum(IntermediateSum::from_stats(stats)).into())
}

/// Holds the intermediate data for metric results
#[derive(Clone, Debug, PartialEq)]
pub enum InternalMetricResult {
    /// Intermediate average result.
    Average(IntermediateAverage),
    /// Intermediate count result.
    Count(IntermediateCount),
    /// Intermediate max result.
    Max(IntermediateMax),
    /// Intermediate min result.
    Min(IntermediateMin),
    /// Intermediate stats result.
    Stats(IntermediateStats),
    /// Intermediate sum result.
    Sum(IntermediateSum),
}

impl InternalMetricResult {
    /// Type tag of the average metric.
    pub const AVG: &'static str = "avg";
    /// Type tag of the value count metric.
    pub const VALUE_COUNT: &'static str = "value_count";
    /// Type tag of the max metric.
    pub const MAX: &'static str = "max";
    /// Type tag of the min metric.
    pub const MIN: &'static str = "min";
    /// Type tag of the stats metric.
    pub const STATS: &'static str = "stats";
    /// Type tag of the sum metric.
    pub const SUM: &'static str = "sum";

    fn type_tag(&self) -> &'static str {
        match self {
            InternalMetricResult::Average(_) => Self::AVG,
            InternalMetricResult::Count(_) => Self::VALUE_COUNT,
            InternalMetricResult::Max(_) => Self::MAX,
            InternalMetricResult::Min(_) => Self::MIN,
            InternalMetricResult::Stats(_) => Self::STATS,
            InternalMetricResult::Sum(_) => Self::SUM,
        }
    }

    fn stats(&self) -> &IntermediateStats {
        match self {
            InternalMetricResult::Average(avg) => &avg.stats,
            InternalMetricResult::Count(count) => &count.stats,
            InternalMetricResult::Max(max) => &max.stats,
            InternalMetricResult::Min(min) => &min.stats,
            InternalMetricResult::Stats(stats) => stats,
            InternalMetricResult::Sum(sum) => &sum.stats,
        }
    }

    fn into_final_metric_result(self) -> MetricResult {
        match self {
            InternalMetricResult::Average(intermediate_avg) => {
                MetricResult::Average(intermediate_avg.finalize().into())
            }
            InternalMetricResult::Count(intermediate_count) => {
                MetricResult::Count(intermediate_count.finalize().into())
            }
            InternalMetricResult::Max(intermediate_max) => {
                MetricResult::Max(intermediate_max.finalize().into())
            }
            InternalMetricResult::Min(intermediate_min) => {
                MetricResult::Min(intermediate_min.finalize().into())
            }
            InternalMetricResult::Stats(intermediate_stats) => {
                MetricResult::Stats(intermediate_stats.finalize())
            }
            InternalMetricResult::Sum(intermediate_sum) => {
                MetricResult::Sum(intermediate_sum.finalize().into())
            }
        }
    }

    fn get_value(&self, agg_property: &str) -> crate::Result<Option<f64>> {
        let single_value = match self {
            InternalMetricResult::Average(avg) => avg.finalize(),
            InternalMetricResult::Count(count) => count.finalize(),
            InternalMetricResult::Max(max) => max.finalize(),
            InternalMetricResult::Min(min) => min.finalize(),
            InternalMetricResult::Sum(sum) => sum.finalize(),
            InternalMetricResult::Stats(stats) => return stats.finalize().get_value(agg_property),
        };
        match agg_property {
            "" | "value" => Ok(single_value),
            _ => Err(ReduceError::InvalidArgument(format!(
                "Unknown property {agg_property} on single value metric aggregation [{}]",
                self.type_tag()
            ))),
        }
    }

    fn merge_fruits(&mut self, other: InternalMetricResult) -> crate::Result<()> {
        match (self, other) {
            (InternalMetricResult::Average(avg_left), InternalMetricResult::Average(avg_right)) => {
                avg_left.merge_fruits(avg_right);
            }
            (
                InternalMetricResult::Count(count_left),
                InternalMetricResult::Count(count_right),
            ) => {
                count_left.merge_fruits(count_right);
            }
            (InternalMetricResult::Max(max_left), InternalMetricResult::Max(max_right)) => {
                max_left.merge_fruits(max_right);
            }
            (InternalMetricResult::Min(min_left), InternalMetricResult::Min(min_right)) => {
                min_left.merge_fruits(min_right);
            }
            (
                InternalMetricResult::Stats(stats_left),
                InternalMetricResult::Stats(stats_right),
            ) => {
                stats_left.merge_fruits(stats_right);
            }
            (InternalMetricResult::Sum(sum_left), InternalMetricResult::Sum(sum_right)) => {
                sum_left.merge_fruits(sum_right);
            }
            (left, right) => {
                return Err(ReduceError::InvariantViolation(format!(
                    "cannot merge aggregation results of type [{}] and [{}]",
                    left.type_tag(),
                    right.type_tag()
                )));
            }
        }
        Ok(())
    }
}
