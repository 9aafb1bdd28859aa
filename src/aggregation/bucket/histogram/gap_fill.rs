//! Insertion of empty buckets between, before and after the buckets of a histogram.

use log::{debug, warn};

use super::{EmptyBucketInfo, HistogramBucket};
use crate::aggregation::{AggregationError, AggregationLimits, Rounding};

/// Returns `buckets` with an empty bucket for every key of the rounding grid that has none.
///
/// `buckets` have to be sorted by ascending key, with unique keys. Empty buckets are added
/// - from the lower extended bound up to the first bucket,
/// - between consecutive buckets,
/// - from the last bucket up to the upper extended bound.
///
/// Without data, the buckets span the extended bounds if both are set, and nothing otherwise.
///
/// A rounding that does not land on the next key, or does not move forward, fails with
/// [`AggregationError::NonTerminatingGapFill`] instead of looping forever.
pub(crate) fn fill_gaps(
    buckets: Vec<HistogramBucket>,
    info: &EmptyBucketInfo,
    limits: &AggregationLimits,
) -> crate::Result<Vec<HistogramBucket>> {
    let bounds = info.bounds().copied().unwrap_or_default();
    let mut filler = GapFiller {
        output: Vec::with_capacity(buckets.len()),
        num_empty_buckets: 0,
        info,
        limits,
    };

    let first_key = buckets.first().map(HistogramBucket::key);
    match (first_key, bounds.min, bounds.max) {
        (Some(first_key), Some(min), _) => {
            filler.fill_while(min, first_key, |key| key < first_key)?;
        }
        (None, Some(min), Some(max)) => {
            filler.fill_while(min, max, |key| key <= max)?;
        }
        _ => {}
    }

    let mut last_key: Option<i64> = None;
    for bucket in buckets {
        if let Some(last_key) = last_key {
            filler.fill_between(last_key, bucket.key())?;
        }
        last_key = Some(bucket.key());
        filler.push(bucket)?;
    }

    if let (Some(last_key), Some(max)) = (last_key, bounds.max) {
        if max > last_key {
            let start = filler.rounding().next_rounding_value(last_key);
            filler.fill_while(start, max, |key| key <= max)?;
        }
    }

    debug!(
        "gap filling added {} empty buckets, {} buckets in total",
        filler.num_empty_buckets,
        filler.output.len()
    );
    Ok(filler.output)
}

struct GapFiller<'a> {
    output: Vec<HistogramBucket>,
    num_empty_buckets: usize,
    info: &'a EmptyBucketInfo,
    limits: &'a AggregationLimits,
}

impl GapFiller<'_> {
    fn rounding(&self) -> &Rounding {
        self.info.rounding()
    }

    fn push(&mut self, bucket: HistogramBucket) -> crate::Result<()> {
        self.limits.validate_bucket_count(self.output.len() + 1)?;
        self.output.push(bucket);
        Ok(())
    }

    fn push_empty(&mut self, key: i64) -> crate::Result<()> {
        let bucket = self.info.empty_bucket(key);
        self.push(bucket)?;
        self.num_empty_buckets += 1;
        Ok(())
    }

    /// Adds empty buckets from `start` on, as long as `in_range` holds. Stops after `to`.
    fn fill_while(
        &mut self,
        start: i64,
        to: i64,
        in_range: impl Fn(i64) -> bool,
    ) -> crate::Result<()> {
        let mut key = start;
        while in_range(key) {
            self.push_empty(key)?;
            if key == to {
                break;
            }
            let next_key = self.rounding().next_rounding_value(key);
            if next_key <= key {
                return Err(non_terminating(key, to));
            }
            key = next_key;
        }
        Ok(())
    }

    /// Adds empty buckets for the keys strictly between two consecutive bucket keys.
    fn fill_between(&mut self, from: i64, to: i64) -> crate::Result<()> {
        let mut previous_key = from;
        let mut key = self.rounding().next_rounding_value(from);
        while key != to {
            if key <= previous_key || key > to {
                return Err(non_terminating(from, to));
            }
            self.push_empty(key)?;
            previous_key = key;
            key = self.rounding().next_rounding_value(key);
        }
        Ok(())
    }
}

fn non_terminating(from: i64, to: i64) -> crate::ReduceError {
    warn!("rounding does not walk from bucket key {from} to {to}, aborting gap filling");
    AggregationError::NonTerminatingGapFill { from, to }.into()
}
