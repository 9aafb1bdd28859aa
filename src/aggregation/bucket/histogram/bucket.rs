use crate::ReduceError;
use crate::aggregation::agg_result::BucketEntry;
use crate::aggregation::intermediate_agg_result::InternalAggregations;
use crate::aggregation::streams::{StreamInput, StreamOutput, Streamable};
use crate::aggregation::{ReduceContext, ValueFormatter};

/// A bucket of a histogram: the documents whose value rounds to `key`.
#[derive(Clone, Debug, PartialEq)]
pub struct HistogramBucket {
    key: i64,
    doc_count: u64,
    sub_aggregations: InternalAggregations,
}

impl HistogramBucket {
    /// Creates a bucket.
    pub fn new(key: i64, doc_count: u64, sub_aggregations: InternalAggregations) -> Self {
        HistogramBucket {
            key,
            doc_count,
            sub_aggregations,
        }
    }

    /// The bucket key, on the grid of the histogram rounding.
    pub fn key(&self) -> i64 {
        self.key
    }

    /// Number of documents in the bucket.
    pub fn doc_count(&self) -> u64 {
        self.doc_count
    }

    /// Sub-aggregation results of the bucket.
    pub fn sub_aggregations(&self) -> &InternalAggregations {
        &self.sub_aggregations
    }

    /// Merges buckets sharing the same key: the document counts are summed up and the
    /// sub-aggregations reduced.
    ///
    /// A single bucket goes through the same path, so that its sub-aggregations are finalized.
    pub(crate) fn reduce(
        buckets: Vec<HistogramBucket>,
        ctx: &ReduceContext,
    ) -> crate::Result<HistogramBucket> {
        let num_buckets = buckets.len();
        let mut buckets = buckets.into_iter();
        let first = buckets.next().ok_or_else(|| {
            ReduceError::InvariantViolation("no bucket to reduce".to_string())
        })?;
        let key = first.key;
        let mut doc_count = first.doc_count;
        let mut sub_aggregations = Vec::with_capacity(num_buckets);
        sub_aggregations.push(first.sub_aggregations);
        for bucket in buckets {
            debug_assert_eq!(bucket.key, key);
            doc_count = doc_count.checked_add(bucket.doc_count).ok_or_else(|| {
                ReduceError::InvariantViolation(format!(
                    "document count of bucket [{key}] overflows"
                ))
            })?;
            sub_aggregations.push(bucket.sub_aggregations);
        }
        Ok(HistogramBucket {
            key,
            doc_count,
            sub_aggregations: InternalAggregations::reduce(sub_aggregations, ctx)?,
        })
    }

    pub(crate) fn finalize(self, ctx: &ReduceContext) -> crate::Result<HistogramBucket> {
        HistogramBucket::reduce(vec![self], ctx)
    }

    pub(crate) fn into_final_bucket_entry(
        self,
        formatter: Option<ValueFormatter>,
    ) -> crate::Result<BucketEntry> {
        let key_as_string = formatter
            .map(|formatter| formatter.format(self.key))
            .transpose()?;
        Ok(BucketEntry {
            key_as_string,
            key: self.key,
            doc_count: self.doc_count,
            sub_aggregation: self.sub_aggregations.into_final_result()?,
        })
    }
}

impl Streamable for HistogramBucket {
    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()> {
        output.write(&self.key)?;
        output.write_vint(self.doc_count)?;
        self.sub_aggregations.write_to(output)
    }

    fn read_from(input: &mut StreamInput<'_>) -> crate::Result<Self> {
        Ok(HistogramBucket {
            key: input.read()?,
            doc_count: input.read_vint()?,
            sub_aggregations: InternalAggregations::read_from(input)?,
        })
    }
}
