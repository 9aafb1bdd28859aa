use log::{debug, trace};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;

use super::gap_fill::fill_gaps;
use super::{EmptyBucketInfo, HistogramBucket, HistogramOrder};
use crate::ReduceError;
use crate::aggregation::agg_result::{BucketEntries, BucketResult};
use crate::aggregation::streams::{StreamInput, StreamOutput, Streamable};
use crate::aggregation::{MemoryConsumption, ReduceContext, ValueFormatter};

/// Intermediate result of a histogram aggregation.
///
/// A shard produces one `InternalHistogram` per histogram aggregation, with buckets sorted by
/// ascending key. [`InternalHistogram::reduce`] merges them into the final histogram:
///
/// - buckets of equal keys are merged, their document counts summed up and their
///   sub-aggregations reduced,
/// - buckets with fewer than `min_doc_count` documents are dropped,
/// - with a `min_doc_count` of 0 the gaps between buckets, and up to the extended bounds, are
///   filled with empty buckets,
/// - the buckets are sorted by the requested [`HistogramOrder`].
///
/// # Invariant
/// `empty_bucket_info` is set if and only if `min_doc_count` is 0. The constructor and the
/// decoder refuse anything else.
#[derive(Clone, Debug)]
pub struct InternalHistogram {
    name: String,
    buckets: Vec<HistogramBucket>,
    /// Lazily built `key => position in buckets` index.
    buckets_by_key: OnceCell<FxHashMap<i64, usize>>,
    order: HistogramOrder,
    min_doc_count: u64,
    empty_bucket_info: Option<EmptyBucketInfo>,
    formatter: Option<ValueFormatter>,
    keyed: bool,
}

impl PartialEq for InternalHistogram {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.buckets == other.buckets
            && self.order == other.order
            && self.min_doc_count == other.min_doc_count
            && self.empty_bucket_info == other.empty_bucket_info
            && self.formatter == other.formatter
            && self.keyed == other.keyed
    }
}

impl InternalHistogram {
    /// Type tag of the histogram on the wire.
    pub const TYPE: &'static str = "histogram";

    /// Creates a histogram result.
    ///
    /// Fails with `InvariantViolation` if `empty_bucket_info` is given with a non zero
    /// `min_doc_count`, or missing with a `min_doc_count` of 0.
    pub fn new(
        name: String,
        buckets: Vec<HistogramBucket>,
        order: HistogramOrder,
        min_doc_count: u64,
        empty_bucket_info: Option<EmptyBucketInfo>,
        formatter: Option<ValueFormatter>,
        keyed: bool,
    ) -> crate::Result<Self> {
        if (min_doc_count == 0) != empty_bucket_info.is_some() {
            return Err(ReduceError::InvariantViolation(format!(
                "histogram [{name}]: the empty bucket info must be set if and only if \
                 min_doc_count is 0, got min_doc_count {min_doc_count}"
            )));
        }
        Ok(InternalHistogram {
            name,
            buckets,
            buckets_by_key: OnceCell::new(),
            order,
            min_doc_count,
            empty_bucket_info,
            formatter,
            keyed,
        })
    }

    /// Name of the aggregation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The buckets, in their current order.
    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.buckets
    }

    /// Consumes the histogram and returns its buckets.
    pub fn into_buckets(self) -> Vec<HistogramBucket> {
        self.buckets
    }

    /// Requested order of the buckets.
    pub fn order(&self) -> &HistogramOrder {
        &self.order
    }

    /// Minimum number of documents of a bucket.
    pub fn min_doc_count(&self) -> u64 {
        self.min_doc_count
    }

    /// Empty bucket info, set iff `min_doc_count` is 0.
    pub fn empty_bucket_info(&self) -> Option<&EmptyBucketInfo> {
        self.empty_bucket_info.as_ref()
    }

    /// Formatter of the bucket keys.
    pub fn formatter(&self) -> Option<ValueFormatter> {
        self.formatter
    }

    /// Whether the buckets render as an object keyed by bucket key.
    pub fn keyed(&self) -> bool {
        self.keyed
    }

    /// Returns the bucket with the key `key`.
    pub fn bucket_by_key(&self, key: i64) -> Option<&HistogramBucket> {
        let buckets_by_key = self.buckets_by_key.get_or_init(|| {
            self.buckets
                .iter()
                .enumerate()
                .map(|(pos, bucket)| (bucket.key(), pos))
                .collect()
        });
        buckets_by_key.get(&key).map(|&pos| &self.buckets[pos])
    }

    /// Returns the bucket with the key `key`, given as a decimal number.
    pub fn bucket_by_key_str(&self, key: &str) -> crate::Result<Option<&HistogramBucket>> {
        let key: i64 = key.parse().map_err(|err| {
            ReduceError::InvalidArgument(format!("invalid histogram bucket key [{key}]: {err}"))
        })?;
        Ok(self.bucket_by_key(key))
    }

    fn set_buckets(&mut self, buckets: Vec<HistogramBucket>) {
        self.buckets = buckets;
        self.buckets_by_key = OnceCell::new();
    }

    fn required_empty_bucket_info(&self) -> crate::Result<&EmptyBucketInfo> {
        self.empty_bucket_info.as_ref().ok_or_else(|| {
            ReduceError::InvariantViolation(format!(
                "histogram [{}] has a min_doc_count of 0 but no empty bucket info",
                self.name
            ))
        })
    }

    /// Merges the partial results of one histogram aggregation.
    ///
    /// The result carries the name, order, `min_doc_count`, empty bucket info, formatter and
    /// keyed flag of the first input.
    pub fn reduce(
        aggregations: Vec<InternalHistogram>,
        ctx: &ReduceContext,
    ) -> crate::Result<InternalHistogram> {
        if aggregations.len() > 1 {
            return Self::reduce_many(aggregations, ctx);
        }
        let aggregation = aggregations.into_iter().next().ok_or_else(|| {
            ReduceError::InvalidArgument("no histogram to reduce".to_string())
        })?;
        aggregation.reduce_single(ctx)
    }

    /// A single partial result only needs its buckets finalized, filtered, gap filled and
    /// ordered. Its keys are already unique.
    fn reduce_single(mut self, ctx: &ReduceContext) -> crate::Result<InternalHistogram> {
        let mut buckets = std::mem::take(&mut self.buckets);
        trace!(
            "reducing histogram [{}] alone, {} buckets",
            self.name,
            buckets.len()
        );
        if self.min_doc_count == 1 {
            let buckets = buckets
                .into_iter()
                .map(|bucket| bucket.finalize(ctx))
                .collect::<crate::Result<Vec<_>>>()?;
            self.set_buckets(buckets);
            return Ok(self);
        }

        buckets.sort_unstable_by_key(|bucket| bucket.key());
        let mut buckets = if self.min_doc_count == 0 {
            let buckets = buckets
                .into_iter()
                .map(|bucket| bucket.finalize(ctx))
                .collect::<crate::Result<Vec<_>>>()?;
            fill_gaps(buckets, self.required_empty_bucket_info()?, ctx.limits())?
        } else {
            let min_doc_count = self.min_doc_count;
            buckets
                .into_iter()
                .filter(|bucket| bucket.doc_count() >= min_doc_count)
                .map(|bucket| bucket.finalize(ctx))
                .collect::<crate::Result<Vec<_>>>()?
        };
        self.order.sort_key_ascending_buckets(&mut buckets)?;
        self.set_buckets(buckets);
        Ok(self)
    }

    fn reduce_many(
        aggregations: Vec<InternalHistogram>,
        ctx: &ReduceContext,
    ) -> crate::Result<InternalHistogram> {
        let num_aggregations = aggregations.len();
        let num_buckets: usize = aggregations.iter().map(|agg| agg.buckets.len()).sum();
        let mut aggregations = aggregations.into_iter();
        let mut reduced = aggregations.next().ok_or_else(|| {
            ReduceError::InvalidArgument("no histogram to reduce".to_string())
        })?;
        let min_doc_count = reduced.min_doc_count;

        let mut buckets = {
            let guard = ctx.limits().new_guard();
            let mut buckets_by_key: FxHashMap<i64, Vec<HistogramBucket>> =
                FxHashMap::with_capacity_and_hasher(num_buckets, Default::default());
            guard.add_memory_consumed(buckets_by_key.memory_consumption() as u64)?;

            let first_buckets = std::mem::take(&mut reduced.buckets);
            for bucket in first_buckets
                .into_iter()
                .chain(aggregations.flat_map(|agg| agg.buckets))
            {
                buckets_by_key
                    .entry(bucket.key())
                    .or_insert_with(|| Vec::with_capacity(num_aggregations))
                    .push(bucket);
            }
            trace!(
                "grouped {num_buckets} buckets of histogram [{}] into {} keys",
                reduced.name,
                buckets_by_key.len()
            );

            let mut buckets = Vec::with_capacity(buckets_by_key.len());
            for (_key, same_key_buckets) in buckets_by_key {
                let bucket = HistogramBucket::reduce(same_key_buckets, ctx)?;
                if bucket.doc_count() >= min_doc_count {
                    buckets.push(bucket);
                }
            }
            buckets
        };

        if min_doc_count == 0 {
            buckets.sort_unstable_by_key(|bucket| bucket.key());
            buckets = fill_gaps(buckets, reduced.required_empty_bucket_info()?, ctx.limits())?;
            reduced.order.sort_key_ascending_buckets(&mut buckets)?;
        } else {
            reduced.order.sort_buckets(&mut buckets)?;
        }
        debug!(
            "reduced {num_aggregations} partial results of histogram [{}] into {} buckets",
            reduced.name,
            buckets.len()
        );
        reduced.set_buckets(buckets);
        Ok(reduced)
    }

    /// Converts the reduced histogram into its final, renderable form.
    pub fn into_final_result(self) -> crate::Result<BucketResult> {
        let formatter = self.formatter;
        let entries = self
            .buckets
            .into_iter()
            .map(|bucket| bucket.into_final_bucket_entry(formatter))
            .collect::<crate::Result<Vec<_>>>()?;
        let buckets = if self.keyed {
            BucketEntries::Keyed(entries)
        } else {
            BucketEntries::Vec(entries)
        };
        Ok(BucketResult::Histogram { buckets })
    }
}

impl Streamable for InternalHistogram {
    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()> {
        output.write_str(&self.name)?;
        self.order.write_to(output)?;
        output.write_vint(self.min_doc_count)?;
        if self.min_doc_count == 0 {
            self.required_empty_bucket_info()?.write_to(output)?;
        }
        output.write_optional(self.formatter.as_ref())?;
        output.write(&self.keyed)?;
        output.write_vint(self.buckets.len() as u64)?;
        for bucket in &self.buckets {
            bucket.write_to(output)?;
        }
        Ok(())
    }

    fn read_from(input: &mut StreamInput<'_>) -> crate::Result<Self> {
        let name = input.read_string()?;
        let order = HistogramOrder::read_from(input)?;
        let min_doc_count = input.read_vint()?;
        let empty_bucket_info = if min_doc_count == 0 {
            Some(EmptyBucketInfo::read_from(input)?)
        } else {
            None
        };
        let formatter = input.read_optional()?;
        let keyed = input.read()?;
        let num_buckets = input.read_len()?;
        let mut buckets = Vec::with_capacity(num_buckets);
        for _ in 0..num_buckets {
            buckets.push(HistogramBucket::read_from(input)?);
        }
        InternalHistogram::new(
            name,
            buckets,
            order,
            min_doc_count,
            empty_bucket_info,
            formatter,
            keyed,
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::aggregation::bucket::ExtendedBounds;
    use crate::aggregation::intermediate_agg_result::{InternalAggregation, InternalAggregations};
    use crate::aggregation::streams::{AggregationStreams, WireVersion, from_bytes, to_bytes};
    use crate::aggregation::tests::{avg_sub_aggs, histogram, keys_and_counts};
    use crate::aggregation::{AggregationError, AggregationLimits, Rounding};

    fn reduce(histograms: Vec<InternalHistogram>) -> crate::Result<InternalHistogram> {
        InternalHistogram::reduce(histograms, &ReduceContext::default())
    }

    #[test]
    fn test_merge_overlapping_keys() -> crate::Result<()> {
        let reduced = reduce(vec![
            histogram(&[(1, 2)], 0, None, HistogramOrder::KeyAsc),
            histogram(&[(1, 3), (2, 1)], 0, None, HistogramOrder::KeyAsc),
        ])?;
        assert_eq!(keys_and_counts(&reduced), vec![(1, 5), (2, 1)]);
        Ok(())
    }

    #[test]
    fn test_fill_gaps_between_shards() -> crate::Result<()> {
        let reduced = reduce(vec![
            histogram(&[(1, 2)], 0, None, HistogramOrder::KeyAsc),
            histogram(&[(5, 1)], 0, None, HistogramOrder::KeyAsc),
        ])?;
        assert_eq!(
            keys_and_counts(&reduced),
            vec![(1, 2), (2, 0), (3, 0), (4, 0), (5, 1)]
        );
        Ok(())
    }

    #[test]
    fn test_fill_up_to_extended_bounds() -> crate::Result<()> {
        let bounds = Some(ExtendedBounds::new(Some(0), Some(6)));
        let reduced = reduce(vec![
            histogram(&[(1, 2)], 0, bounds, HistogramOrder::KeyAsc),
            histogram(&[(5, 1)], 0, bounds, HistogramOrder::KeyAsc),
        ])?;
        assert_eq!(
            keys_and_counts(&reduced),
            vec![(0, 0), (1, 2), (2, 0), (3, 0), (4, 0), (5, 1), (6, 0)]
        );
        Ok(())
    }

    #[test]
    fn test_min_doc_count_filter() -> crate::Result<()> {
        let reduced = reduce(vec![histogram(
            &[(1, 2), (2, 1)],
            2,
            None,
            HistogramOrder::KeyAsc,
        )])?;
        assert_eq!(keys_and_counts(&reduced), vec![(1, 2)]);

        let reduced = reduce(vec![
            histogram(&[(1, 1), (2, 1)], 2, None, HistogramOrder::KeyAsc),
            histogram(&[(2, 1), (3, 1)], 2, None, HistogramOrder::KeyAsc),
        ])?;
        assert_eq!(keys_and_counts(&reduced), vec![(2, 2)]);
        Ok(())
    }

    #[test]
    fn test_single_input_min_doc_count_one_is_unchanged() -> crate::Result<()> {
        let reduced = reduce(vec![histogram(
            &[(2, 1), (1, 1)],
            1,
            None,
            HistogramOrder::KeyAsc,
        )])?;
        assert_eq!(keys_and_counts(&reduced), vec![(2, 1), (1, 1)]);
        Ok(())
    }

    #[test]
    fn test_empty_data() -> crate::Result<()> {
        let reduced = reduce(vec![
            histogram(&[], 0, None, HistogramOrder::KeyAsc),
            histogram(&[], 0, None, HistogramOrder::KeyAsc),
        ])?;
        assert!(reduced.buckets().is_empty());

        let bounds = Some(ExtendedBounds::new(Some(-1), Some(1)));
        let reduced = reduce(vec![histogram(&[], 0, bounds, HistogramOrder::KeyDesc)])?;
        assert_eq!(keys_and_counts(&reduced), vec![(1, 0), (0, 0), (-1, 0)]);
        Ok(())
    }

    #[test]
    fn test_reduce_nothing() {
        let err = reduce(Vec::new()).unwrap_err();
        assert!(matches!(err, ReduceError::InvalidArgument(_)));
    }

    #[test]
    fn test_key_desc_after_gap_fill() -> crate::Result<()> {
        let reduced = reduce(vec![
            histogram(&[(1, 2)], 0, None, HistogramOrder::KeyDesc),
            histogram(&[(3, 1)], 0, None, HistogramOrder::KeyDesc),
        ])?;
        assert_eq!(keys_and_counts(&reduced), vec![(3, 1), (2, 0), (1, 2)]);
        Ok(())
    }

    #[test]
    fn test_key_desc_reduced_again_alone() -> crate::Result<()> {
        let reduced = reduce(vec![
            histogram(&[(1, 2), (2, 2), (3, 1)], 2, None, HistogramOrder::KeyDesc),
            histogram(&[(1, 1), (2, 1), (3, 1)], 2, None, HistogramOrder::KeyDesc),
        ])?;
        assert_eq!(keys_and_counts(&reduced), vec![(3, 2), (2, 3), (1, 3)]);
        let reduced_again = reduce(vec![reduced])?;
        assert_eq!(keys_and_counts(&reduced_again), vec![(3, 2), (2, 3), (1, 3)]);
        Ok(())
    }

    #[test]
    fn test_count_order() -> crate::Result<()> {
        let reduced = reduce(vec![
            histogram(&[(1, 2), (2, 4)], 1, None, HistogramOrder::CountDesc),
            histogram(&[(1, 2), (3, 1)], 1, None, HistogramOrder::CountDesc),
        ])?;
        assert_eq!(keys_and_counts(&reduced), vec![(1, 4), (2, 4), (3, 1)]);
        Ok(())
    }

    fn with_avg(buckets: &[(i64, &[f64])], min_doc_count: u64) -> InternalHistogram {
        let buckets = buckets
            .iter()
            .map(|(key, values)| {
                HistogramBucket::new(*key, values.len() as u64, avg_sub_aggs(values))
            })
            .collect();
        let empty_bucket_info = (min_doc_count == 0).then(|| {
            EmptyBucketInfo::new(Rounding::interval(1).unwrap(), avg_sub_aggs(&[]), None)
        });
        InternalHistogram::new(
            "histo".to_string(),
            buckets,
            HistogramOrder::sub_aggregation("avg", false),
            min_doc_count,
            empty_bucket_info,
            None,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_sub_aggregation_order_with_gap_fill() -> crate::Result<()> {
        let reduced = reduce(vec![
            with_avg(&[(1, &[2.0]), (4, &[8.0])], 0),
            with_avg(&[(1, &[4.0])], 0),
        ])?;
        // avg desc, then the empty buckets ordered as f64::MIN by ascending key
        assert_eq!(
            keys_and_counts(&reduced),
            vec![(4, 1), (1, 2), (2, 0), (3, 0)]
        );
        let first = &reduced.buckets()[1];
        assert_eq!(first.sub_aggregations().get_value("avg")?, Some(3.0));
        Ok(())
    }

    #[test]
    fn test_sub_aggregation_order_ties_by_key() -> crate::Result<()> {
        let reduced = reduce(vec![
            with_avg(&[(3, &[5.0]), (1, &[5.0])], 1),
            with_avg(&[(2, &[5.0])], 1),
        ])?;
        assert_eq!(keys_and_counts(&reduced), vec![(1, 1), (2, 1), (3, 1)]);
        Ok(())
    }

    #[test]
    fn test_misaligned_keys_fail() -> crate::Result<()> {
        let info =
            EmptyBucketInfo::new(Rounding::interval(2).unwrap(), Default::default(), None);
        let build = |key| {
            InternalHistogram::new(
                "histo".to_string(),
                vec![HistogramBucket::new(key, 1, InternalAggregations::default())],
                HistogramOrder::KeyAsc,
                0,
                Some(info.clone()),
                None,
                false,
            )
        };
        let err = reduce(vec![build(0)?, build(5)?]).unwrap_err();
        assert!(matches!(
            err,
            ReduceError::AggregationError(AggregationError::NonTerminatingGapFill {
                from: 0,
                to: 5
            })
        ));
        Ok(())
    }

    #[test]
    fn test_invariant_violation() {
        let err = InternalHistogram::new(
            "histo".to_string(),
            Vec::new(),
            HistogramOrder::KeyAsc,
            0,
            None,
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ReduceError::InvariantViolation(_)));

        let info = EmptyBucketInfo::new(Rounding::interval(1).unwrap(), Default::default(), None);
        let err = InternalHistogram::new(
            "histo".to_string(),
            Vec::new(),
            HistogramOrder::KeyAsc,
            1,
            Some(info),
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, ReduceError::InvariantViolation(_)));
    }

    #[test]
    fn test_memory_exceeded() {
        let limits = AggregationLimits::new(Some(10), None);
        let ctx = ReduceContext::new(limits.clone());
        let err = InternalHistogram::reduce(
            vec![
                histogram(&[(1, 1), (2, 1)], 1, None, HistogramOrder::KeyAsc),
                histogram(&[(3, 1)], 1, None, HistogramOrder::KeyAsc),
            ],
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReduceError::AggregationError(AggregationError::MemoryExceeded { .. })
        ));
        assert_eq!(limits.get_memory_consumed(), 0u64);
    }

    #[test]
    fn test_bucket_limit() {
        let ctx = ReduceContext::new(AggregationLimits::new(None, Some(3)));
        let err = InternalHistogram::reduce(
            vec![
                histogram(&[(0, 1)], 0, None, HistogramOrder::KeyAsc),
                histogram(&[(10, 1)], 0, None, HistogramOrder::KeyAsc),
            ],
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ReduceError::AggregationError(AggregationError::BucketLimitExceeded { limit: 3, .. })
        ));
    }

    #[test]
    fn test_nested_histogram_is_gap_filled_in_single_contributor_bucket() -> crate::Result<()> {
        let nested = histogram(&[(10, 1), (12, 1)], 0, None, HistogramOrder::KeyAsc);
        let sub_aggregations =
            InternalAggregations::from_entries(vec![("nested".to_string(), nested.into())]);
        let outer = |buckets: Vec<HistogramBucket>| {
            InternalHistogram::new(
                "outer".to_string(),
                buckets,
                HistogramOrder::KeyAsc,
                1,
                None,
                None,
                false,
            )
        };
        let reduced = reduce(vec![
            outer(vec![HistogramBucket::new(1, 2, sub_aggregations)])?,
            outer(vec![HistogramBucket::new(
                2,
                1,
                InternalAggregations::default(),
            )])?,
        ])?;
        let bucket = reduced.bucket_by_key(1).unwrap();
        let Some(InternalAggregation::Histogram(nested)) = bucket.sub_aggregations().get("nested")
        else {
            panic!("expected a nested histogram");
        };
        assert_eq!(keys_and_counts(nested), vec![(10, 1), (11, 0), (12, 1)]);
        Ok(())
    }

    #[test]
    fn test_bucket_by_key() -> crate::Result<()> {
        let mut reduced = reduce(vec![
            histogram(&[(1, 2)], 0, None, HistogramOrder::KeyAsc),
            histogram(&[(3, 1)], 0, None, HistogramOrder::KeyAsc),
        ])?;
        assert_eq!(reduced.bucket_by_key(2).map(|bucket| bucket.doc_count()), Some(0));
        assert_eq!(
            reduced.bucket_by_key_str("3")?.map(|bucket| bucket.doc_count()),
            Some(1)
        );
        assert!(reduced.bucket_by_key(4).is_none());
        assert!(matches!(
            reduced.bucket_by_key_str("three"),
            Err(ReduceError::InvalidArgument(_))
        ));

        reduced.set_buckets(vec![HistogramBucket::new(
            4,
            7,
            InternalAggregations::default(),
        )]);
        assert!(reduced.bucket_by_key(1).is_none());
        assert_eq!(reduced.bucket_by_key(4).map(|bucket| bucket.doc_count()), Some(7));
        Ok(())
    }

    fn full_histogram() -> InternalHistogram {
        let info = EmptyBucketInfo::new(
            Rounding::pre_post(Rounding::interval(10).unwrap(), 2, -2),
            avg_sub_aggs(&[]),
            Some(ExtendedBounds::new(Some(-12), Some(28))),
        );
        InternalHistogram::new(
            "histo".to_string(),
            vec![
                HistogramBucket::new(-2, 2, avg_sub_aggs(&[1.0, 2.0])),
                HistogramBucket::new(8, 1, avg_sub_aggs(&[3.0])),
            ],
            HistogramOrder::sub_aggregation("avg.value", true),
            0,
            Some(info),
            Some(ValueFormatter::Raw),
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_wire_round_trip() -> crate::Result<()> {
        let streams = AggregationStreams::default();
        let histogram = full_histogram();
        let bytes = to_bytes(&histogram, WireVersion::CURRENT)?;
        let decoded: InternalHistogram = from_bytes(&bytes, WireVersion::CURRENT, &streams)?;
        assert_eq!(decoded, histogram);
        Ok(())
    }

    #[test]
    fn test_wire_old_version_drops_bounds() -> crate::Result<()> {
        let streams = AggregationStreams::default();
        let bytes = to_bytes(&full_histogram(), WireVersion::V_1_0_0)?;
        let decoded: InternalHistogram = from_bytes(&bytes, WireVersion::V_1_0_0, &streams)?;
        let info = decoded.empty_bucket_info().unwrap();
        assert_eq!(info.bounds(), None);
        assert_eq!(decoded.buckets(), full_histogram().buckets());
        Ok(())
    }

    #[test]
    fn test_wire_malformed() -> crate::Result<()> {
        let streams = AggregationStreams::default();
        let bytes = to_bytes(&full_histogram(), WireVersion::CURRENT)?;
        for len in [0, 3, bytes.len() / 2, bytes.len() - 1] {
            let err = from_bytes::<InternalHistogram>(&bytes[..len], WireVersion::CURRENT, &streams)
                .unwrap_err();
            assert!(matches!(err, ReduceError::ProtocolError(_)), "{err:?}");
        }
        let mut trailing = bytes.clone();
        trailing.push(0);
        assert!(matches!(
            from_bytes::<InternalHistogram>(&trailing, WireVersion::CURRENT, &streams),
            Err(ReduceError::ProtocolError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_render_keyed() -> crate::Result<()> {
        let histogram = InternalHistogram::new(
            "histo".to_string(),
            vec![
                HistogramBucket::new(1, 2, avg_sub_aggs(&[1.0, 2.0])),
                HistogramBucket::new(0, 1, avg_sub_aggs(&[4.0])),
            ],
            HistogramOrder::KeyDesc,
            1,
            None,
            Some(ValueFormatter::Ipv4),
            true,
        )?;
        let rendered = serde_json::to_string(&histogram.into_final_result()?).unwrap();
        assert_eq!(
            rendered,
            r#"{"buckets":{"0.0.0.1":{"key_as_string":"0.0.0.1","key":1,"doc_count":2,"avg":{"value":1.5}},"0.0.0.0":{"key_as_string":"0.0.0.0","key":0,"doc_count":1,"avg":{"value":4.0}}}}"#
        );
        Ok(())
    }

    #[test]
    fn test_render_list() -> crate::Result<()> {
        let reduced = reduce(vec![
            histogram(&[(1, 2)], 0, None, HistogramOrder::KeyAsc),
            histogram(&[(3, 1)], 0, None, HistogramOrder::KeyAsc),
        ])?;
        assert_eq!(
            serde_json::to_value(reduced.into_final_result()?).unwrap(),
            json!({
                "buckets": [
                    { "key": 1, "doc_count": 2 },
                    { "key": 2, "doc_count": 0 },
                    { "key": 3, "doc_count": 1 }
                ]
            })
        );
        Ok(())
    }
}
