#![warn(missing_docs)]
#![allow(clippy::len_without_is_empty)]

//! Reduction of distributed histogram aggregation results.
//!
//! Each shard of a distributed search answers a histogram aggregation with a partial
//! [`InternalHistogram`](aggregation::bucket::InternalHistogram): a list of buckets sorted by
//! key, each carrying a document count and a tree of nested sub-aggregation results.
//! This crate merges those partial results, level after level, into one histogram that is
//!
//! - free of duplicate keys, with the document counts of equal keys summed up,
//! - filtered by `min_doc_count`,
//! - gap filled with empty buckets when `min_doc_count` is zero, optionally up to the
//!   user requested extended bounds,
//! - ordered as requested, by key, by document count or by a nested metric value.
//!
//! Partial results travel between nodes in a compact binary format, see
//! [`streams`](aggregation::streams), and the final result renders to the
//! elasticsearch-compatible JSON shape, see [`agg_result`](aggregation::agg_result).
//!
//! ```
//! use histogram_reduce::aggregation::bucket::{HistogramBucket, HistogramOrder, InternalHistogram};
//! use histogram_reduce::aggregation::bucket::EmptyBucketInfo;
//! use histogram_reduce::aggregation::intermediate_agg_result::InternalAggregations;
//! use histogram_reduce::aggregation::{ReduceContext, Rounding};
//!
//! let shard = |buckets: Vec<(i64, u64)>| {
//!     let empty_bucket_info =
//!         EmptyBucketInfo::new(Rounding::interval(1)?, InternalAggregations::default(), None);
//!     InternalHistogram::new(
//!         "prices".to_string(),
//!         buckets
//!             .into_iter()
//!             .map(|(key, doc_count)| {
//!                 HistogramBucket::new(key, doc_count, InternalAggregations::default())
//!             })
//!             .collect(),
//!         HistogramOrder::KeyAsc,
//!         0,
//!         Some(empty_bucket_info),
//!         None,
//!         false,
//!     )
//! };
//!
//! let merged = InternalHistogram::reduce(
//!     vec![shard(vec![(1, 2)])?, shard(vec![(5, 1)])?],
//!     &ReduceContext::default(),
//! )?;
//! let keys: Vec<i64> = merged.buckets().iter().map(|bucket| bucket.key()).collect();
//! assert_eq!(keys, vec![1, 2, 3, 4, 5]);
//! # Ok::<(), histogram_reduce::ReduceError>(())
//! ```

pub mod aggregation;
pub mod common;
mod error;

pub use crate::error::ReduceError;

/// Result type of the reduction.
pub type Result<T> = std::result::Result<T, ReduceError>;
