use thiserror::Error;

use crate::common::ByteCount;

/// Error that may occur while reducing aggregation results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregationError {
    /// Memory limit exceeded.
    #[error(
        "Aborting aggregation because memory limit was exceeded. Limit: {limit:?}, Current: \
         {current:?}"
    )]
    MemoryExceeded {
        /// Memory consumption limit
        limit: ByteCount,
        /// Current memory consumption
        current: ByteCount,
    },
    /// Bucket limit exceeded.
    #[error(
        "Aborting aggregation because bucket limit was exceeded. Limit: {limit:?}, Current: \
         {current:?}"
    )]
    BucketLimitExceeded {
        /// Bucket limit
        limit: u32,
        /// Current num buckets
        current: u32,
    },
    /// The rounding can not step from one bucket key to the next one.
    ///
    /// Happens when partial results were computed with inconsistent roundings, or when a
    /// rounding stops advancing at the end of the key space.
    #[error(
        "Gap filling does not terminate: key {to} is not reachable from key {from} with the \
         rounding of the histogram"
    )]
    NonTerminatingGapFill {
        /// Key the walk started from
        from: i64,
        /// Key the walk was supposed to reach
        to: i64,
    },
}
