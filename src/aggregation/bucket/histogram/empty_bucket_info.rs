use super::{ExtendedBounds, HistogramBucket};
use crate::aggregation::Rounding;
use crate::aggregation::intermediate_agg_result::InternalAggregations;
use crate::aggregation::streams::{StreamInput, StreamOutput, Streamable, WireVersion};

/// What a histogram needs to create empty buckets: the rounding to walk from one key to the
/// next, the sub-aggregation results of a bucket without documents, and the optional extended
/// bounds.
///
/// Present if and only if `min_doc_count` is 0.
#[derive(Clone, Debug, PartialEq)]
pub struct EmptyBucketInfo {
    rounding: Rounding,
    sub_aggregations: InternalAggregations,
    bounds: Option<ExtendedBounds>,
}

impl EmptyBucketInfo {
    /// Creates the info. `sub_aggregations` is cloned into every empty bucket.
    pub fn new(
        rounding: Rounding,
        sub_aggregations: InternalAggregations,
        bounds: Option<ExtendedBounds>,
    ) -> Self {
        EmptyBucketInfo {
            rounding,
            sub_aggregations,
            bounds,
        }
    }

    /// The rounding of the histogram.
    pub fn rounding(&self) -> &Rounding {
        &self.rounding
    }

    /// Sub-aggregations of an empty bucket.
    pub fn sub_aggregations(&self) -> &InternalAggregations {
        &self.sub_aggregations
    }

    /// The extended bounds, if any.
    pub fn bounds(&self) -> Option<&ExtendedBounds> {
        self.bounds.as_ref()
    }

    pub(crate) fn empty_bucket(&self, key: i64) -> HistogramBucket {
        HistogramBucket::new(key, 0, self.sub_aggregations.clone())
    }
}

impl Streamable for EmptyBucketInfo {
    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()> {
        self.rounding.write_to(output)?;
        self.sub_aggregations.write_to(output)?;
        if output.version().on_or_after(WireVersion::V_1_1_0) {
            output.write_optional(self.bounds.as_ref())?;
        }
        Ok(())
    }

    fn read_from(input: &mut StreamInput<'_>) -> crate::Result<Self> {
        let rounding = Rounding::read_from(input)?;
        let sub_aggregations = InternalAggregations::read_from(input)?;
        let bounds = if input.version().on_or_after(WireVersion::V_1_1_0) {
            input.read_optional()?
        } else {
            None
        };
        Ok(EmptyBucketInfo {
            rounding,
            sub_aggregations,
            bounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::streams::{AggregationStreams, from_bytes, to_bytes};
    use crate::aggregation::tests::avg_sub_aggs;

    fn info() -> EmptyBucketInfo {
        EmptyBucketInfo::new(
            Rounding::interval(10).unwrap(),
            avg_sub_aggs(&[]),
            Some(ExtendedBounds::new(Some(-10), None)),
        )
    }

    #[test]
    fn test_round_trip_current_version() -> crate::Result<()> {
        let bytes = to_bytes(&info(), WireVersion::CURRENT)?;
        let decoded: EmptyBucketInfo =
            from_bytes(&bytes, WireVersion::CURRENT, &AggregationStreams::default())?;
        assert_eq!(decoded, info());
        Ok(())
    }

    #[test]
    fn test_bounds_are_dropped_for_old_peers() -> crate::Result<()> {
        let bytes = to_bytes(&info(), WireVersion::V_1_0_0)?;
        let decoded: EmptyBucketInfo =
            from_bytes(&bytes, WireVersion::V_1_0_0, &AggregationStreams::default())?;
        assert_eq!(decoded.bounds(), None);
        assert_eq!(decoded.rounding(), info().rounding());
        assert_eq!(decoded.sub_aggregations(), info().sub_aggregations());
        Ok(())
    }

    #[test]
    fn test_empty_bucket() -> crate::Result<()> {
        let bucket = info().empty_bucket(20);
        assert_eq!(bucket.key(), 20);
        assert_eq!(bucket.doc_count(), 0);
        assert_eq!(bucket.sub_aggregations().get_value("avg")?, None);
        Ok(())
    }
}
