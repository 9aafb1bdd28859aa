//! Module for all bucket aggregations.
//!
//! Bucket aggregations create buckets of documents, each bucket carrying a document count and
//! its own tree of sub-aggregations.
//!
//! Results of final buckets are [BucketResult](super::agg_result::BucketResult).
//! Results of intermediate buckets are [InternalHistogram].

mod histogram;

pub use histogram::*;
