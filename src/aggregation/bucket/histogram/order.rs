use std::cmp::Reverse;

use super::HistogramBucket;
use crate::ReduceError;
use crate::aggregation::get_agg_name_and_property;
use crate::aggregation::streams::{StreamInput, StreamOutput, Streamable};

const SUB_AGGREGATION_ID: u8 = 0;
const KEY_ASC_ID: u8 = 1;
const KEY_DESC_ID: u8 = 2;
const COUNT_ASC_ID: u8 = 3;
const COUNT_DESC_ID: u8 = 4;

/// Final order of the buckets of a histogram.
///
/// Ties on count or on metric value are broken by ascending key, so that the order is total.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum HistogramOrder {
    /// Ascending key.
    #[default]
    KeyAsc,
    /// Descending key.
    KeyDesc,
    /// Ascending document count.
    CountAsc,
    /// Descending document count.
    CountDesc,
    /// Order by a metric nested in the buckets, e.g. `avg_price` or `price_stats.max`.
    ///
    /// Buckets missing a value order as if they had `f64::MIN`.
    SubAggregation {
        /// Path to the metric value.
        path: String,
        /// Ascending or descending.
        asc: bool,
    },
}

impl HistogramOrder {
    /// Order by the value found at `path` in the sub-aggregations of the buckets.
    pub fn sub_aggregation(path: impl Into<String>, asc: bool) -> Self {
        HistogramOrder::SubAggregation {
            path: path.into(),
            asc,
        }
    }

    /// Returns true for the orders on the bucket key.
    pub fn is_key_order(&self) -> bool {
        matches!(self, HistogramOrder::KeyAsc | HistogramOrder::KeyDesc)
    }

    /// Sorts buckets with unique keys.
    pub(crate) fn sort_buckets(&self, buckets: &mut Vec<HistogramBucket>) -> crate::Result<()> {
        match self {
            HistogramOrder::KeyAsc => buckets.sort_unstable_by_key(|bucket| bucket.key()),
            HistogramOrder::KeyDesc => {
                buckets.sort_unstable_by_key(|bucket| Reverse(bucket.key()))
            }
            HistogramOrder::CountAsc => {
                buckets.sort_unstable_by_key(|bucket| (bucket.doc_count(), bucket.key()))
            }
            HistogramOrder::CountDesc => {
                buckets.sort_unstable_by_key(|bucket| (Reverse(bucket.doc_count()), bucket.key()))
            }
            HistogramOrder::SubAggregation { path, asc } => {
                let (agg_name, agg_property) = get_agg_name_and_property(path);
                let mut buckets_with_val = std::mem::take(buckets)
                    .into_iter()
                    .map(|bucket| {
                        let val = bucket
                            .sub_aggregations()
                            .get_value_from_aggregation(agg_name, agg_property)?
                            .unwrap_or(f64::MIN);
                        Ok((bucket, val))
                    })
                    .collect::<crate::Result<Vec<_>>>()?;
                buckets_with_val.sort_unstable_by(|(left, left_val), (right, right_val)| {
                    let cmp = if *asc {
                        left_val.total_cmp(right_val)
                    } else {
                        right_val.total_cmp(left_val)
                    };
                    cmp.then_with(|| left.key().cmp(&right.key()))
                });
                *buckets = buckets_with_val
                    .into_iter()
                    .map(|(bucket, _val)| bucket)
                    .collect();
            }
        }
        Ok(())
    }

    /// Orders buckets that are already sorted by ascending key.
    pub(crate) fn sort_key_ascending_buckets(
        &self,
        buckets: &mut Vec<HistogramBucket>,
    ) -> crate::Result<()> {
        match self {
            HistogramOrder::KeyAsc => Ok(()),
            HistogramOrder::KeyDesc => {
                buckets.reverse();
                Ok(())
            }
            _ => self.sort_buckets(buckets),
        }
    }

    fn id(&self) -> u8 {
        match self {
            HistogramOrder::KeyAsc => KEY_ASC_ID,
            HistogramOrder::KeyDesc => KEY_DESC_ID,
            HistogramOrder::CountAsc => COUNT_ASC_ID,
            HistogramOrder::CountDesc => COUNT_DESC_ID,
            HistogramOrder::SubAggregation { .. } => SUB_AGGREGATION_ID,
        }
    }
}

impl Streamable for HistogramOrder {
    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()> {
        output.write(&self.id())?;
        if let HistogramOrder::SubAggregation { path, asc } = self {
            output.write(asc)?;
            output.write_str(path)?;
        }
        Ok(())
    }

    fn read_from(input: &mut StreamInput<'_>) -> crate::Result<Self> {
        match input.read::<u8>()? {
            KEY_ASC_ID => Ok(HistogramOrder::KeyAsc),
            KEY_DESC_ID => Ok(HistogramOrder::KeyDesc),
            COUNT_ASC_ID => Ok(HistogramOrder::CountAsc),
            COUNT_DESC_ID => Ok(HistogramOrder::CountDesc),
            SUB_AGGREGATION_ID => {
                let asc = input.read::<bool>()?;
                let path = input.read_string()?;
                Ok(HistogramOrder::SubAggregation { path, asc })
            }
            id => Err(ReduceError::ProtocolError(format!(
                "unknown histogram order id [{id}]"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::intermediate_agg_result::InternalAggregations;
    use crate::aggregation::tests::avg_sub_aggs;

    fn keys(buckets: &[HistogramBucket]) -> Vec<i64> {
        buckets.iter().map(|bucket| bucket.key()).collect()
    }

    fn counted(buckets: &[(i64, u64)]) -> Vec<HistogramBucket> {
        buckets
            .iter()
            .map(|&(key, doc_count)| {
                HistogramBucket::new(key, doc_count, InternalAggregations::default())
            })
            .collect()
    }

    #[test]
    fn test_count_order_breaks_ties_by_key() -> crate::Result<()> {
        let mut buckets = counted(&[(3, 2), (1, 5), (2, 2), (0, 1)]);
        HistogramOrder::CountDesc.sort_buckets(&mut buckets)?;
        assert_eq!(keys(&buckets), vec![1, 2, 3, 0]);
        HistogramOrder::CountAsc.sort_buckets(&mut buckets)?;
        assert_eq!(keys(&buckets), vec![0, 2, 3, 1]);
        Ok(())
    }

    #[test]
    fn test_key_orders() -> crate::Result<()> {
        let mut buckets = counted(&[(3, 2), (-1, 5), (2, 2)]);
        HistogramOrder::KeyDesc.sort_buckets(&mut buckets)?;
        assert_eq!(keys(&buckets), vec![3, 2, -1]);
        HistogramOrder::KeyAsc.sort_buckets(&mut buckets)?;
        assert_eq!(keys(&buckets), vec![-1, 2, 3]);
        HistogramOrder::KeyDesc.sort_key_ascending_buckets(&mut buckets)?;
        assert_eq!(keys(&buckets), vec![3, 2, -1]);
        Ok(())
    }

    #[test]
    fn test_sub_aggregation_order() -> crate::Result<()> {
        let mut buckets = vec![
            HistogramBucket::new(1, 1, avg_sub_aggs(&[5.0])),
            HistogramBucket::new(2, 1, avg_sub_aggs(&[])),
            HistogramBucket::new(3, 1, avg_sub_aggs(&[5.0])),
            HistogramBucket::new(4, 1, avg_sub_aggs(&[9.0])),
        ];
        HistogramOrder::sub_aggregation("avg", false).sort_buckets(&mut buckets)?;
        assert_eq!(keys(&buckets), vec![4, 1, 3, 2]);
        HistogramOrder::sub_aggregation("avg.value", true).sort_buckets(&mut buckets)?;
        assert_eq!(keys(&buckets), vec![2, 1, 3, 4]);
        Ok(())
    }

    #[test]
    fn test_sub_aggregation_order_unknown_path() {
        let mut buckets = vec![HistogramBucket::new(1, 1, avg_sub_aggs(&[5.0]))];
        let err = HistogramOrder::sub_aggregation("max", true)
            .sort_buckets(&mut buckets)
            .unwrap_err();
        assert!(matches!(err, ReduceError::InvalidArgument(_)));
    }
}
