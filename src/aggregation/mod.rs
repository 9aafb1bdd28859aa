//! # Aggregations
//!
//! An aggregation summarizes data as statistics on buckets or metrics. In a distributed
//! search every shard computes intermediate aggregation results over its own documents, and
//! the coordinating node merges them into the final answer.
//!
//! This module contains the merge side of the [Histogram](bucket::InternalHistogram) bucket
//! aggregation, and the [Metrics](metric) that can be nested below its buckets.
//!
//! ## Distributed Aggregation
//! Intermediate results arrive as bytes, see [`streams`]. They are decoded into
//! [`InternalAggregations`](intermediate_agg_result::InternalAggregations) trees, merged with
//! [`InternalAggregations::reduce`](intermediate_agg_result::InternalAggregations::reduce) and
//! converted into the JSON compatible [`AggregationResults`](agg_result::AggregationResults)
//! with
//! [`into_final_result`](intermediate_agg_result::InternalAggregations::into_final_result).
//!
//! Merges of the same request share one [`ReduceContext`], whose [`AggregationLimits`] bound
//! the memory of the merge and the number of buckets of a histogram.
//!
//! ## JSON Format
//! Result structures serialize into elasticsearch compatible JSON.
//!
//! Notice: Intermediate aggregation results should not be de/serialized via JSON format.
//! Use the binary format of [`streams`].

mod agg_limits;
pub mod agg_result;
pub mod bucket;
mod date;
mod error;
mod format;
pub mod intermediate_agg_result;
pub mod metric;
mod reduce_context;
mod rounding;
pub mod streams;

pub use agg_limits::{AggregationLimits, MemoryConsumption, ReduceSettings, ResourceLimitGuard};
pub use error::AggregationError;
pub use format::ValueFormatter;
pub use reduce_context::ReduceContext;
pub use rounding::{Interval, Rounding};

/// Default memory limit of a reduction, 500MB.
pub const DEFAULT_MEMORY_LIMIT: u64 = 500_000_000;

/// Default maximum number of buckets of a reduced histogram.
pub const DEFAULT_BUCKET_LIMIT: u32 = 65000;

/// Represents an associative array `(key => values)` in a very efficient manner.
#[derive(PartialEq)]
pub(crate) struct VecWithNames<T> {
    pub(crate) values: Vec<T>,
    keys: Vec<String>,
}

impl<T: Clone> Clone for VecWithNames<T> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            keys: self.keys.clone(),
        }
    }
}

impl<T> Default for VecWithNames<T> {
    fn default() -> Self {
        Self {
            values: Default::default(),
            keys: Default::default(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for VecWithNames<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T> VecWithNames<T> {
    pub(crate) fn from_entries(mut entries: Vec<(String, T)>) -> Self {
        // Sort to ensure order of elements match across multiple instances
        entries.sort_by(|left, right| left.0.cmp(&right.0));
        let mut data = Vec::with_capacity(entries.len());
        let mut data_names = Vec::with_capacity(entries.len());
        for entry in entries {
            data_names.push(entry.0);
            data.push(entry.1);
        }
        VecWithNames {
            values: data,
            keys: data_names,
        }
    }
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.keys().zip(self.values.iter())
    }
    pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, T)> {
        self.keys.into_iter().zip(self.values)
    }
    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter().map(|key| key.as_str())
    }
    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }
    pub(crate) fn get(&self, name: &str) -> Option<&T> {
        self.keys()
            .position(|key| key == name)
            .map(|pos| &self.values[pos])
    }
}

/// Splits an ordering path like `stats.avg` into the aggregation name and the property.
pub(crate) fn get_agg_name_and_property(name: &str) -> (&str, &str) {
    let (agg_name, agg_property) = name.split_once('.').unwrap_or((name, ""));
    (agg_name, agg_property)
}
