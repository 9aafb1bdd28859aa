use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::{AggregationError, DEFAULT_BUCKET_LIMIT, DEFAULT_MEMORY_LIMIT};
use crate::common::ByteCount;

/// An estimate for memory consumption. Non recursive
pub trait MemoryConsumption {
    /// Estimated number of bytes held by the container itself.
    fn memory_consumption(&self) -> usize;
}

impl<K, V, S> MemoryConsumption for HashMap<K, V, S> {
    fn memory_consumption(&self) -> usize {
        let capacity = self.capacity();
        (std::mem::size_of::<K>() + std::mem::size_of::<V>() + 1) * capacity
    }
}

/// Settings of the reduction, as they can be found in a node configuration.
///
/// ```json
/// { "memory_limit": 100000000, "bucket_limit": 10000 }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceSettings {
    /// Memory limit in bytes. Defaults to `DEFAULT_MEMORY_LIMIT`.
    #[serde(default)]
    pub memory_limit: Option<u64>,
    /// Maximum number of buckets a reduced histogram may hold. Defaults to
    /// `DEFAULT_BUCKET_LIMIT`.
    #[serde(default)]
    pub bucket_limit: Option<u32>,
}

impl From<ReduceSettings> for AggregationLimits {
    fn from(settings: ReduceSettings) -> Self {
        AggregationLimits::new(settings.memory_limit, settings.bucket_limit)
    }
}

/// Aggregation memory limit after which the reduction fails. Defaults to DEFAULT_MEMORY_LIMIT
/// (500MB). The limit is shared by all clones of an instance, so that concurrent merge calls
/// of one request account into the same counter.
#[derive(Debug)]
pub struct AggregationLimits {
    /// The counter which is shared between the merge calls of one request.
    memory_consumption: Arc<AtomicU64>,
    /// The memory_limit in bytes
    memory_limit: ByteCount,
    /// The maximum number of buckets of one reduced histogram.
    bucket_limit: u32,
}

impl Clone for AggregationLimits {
    fn clone(&self) -> Self {
        Self {
            memory_consumption: Arc::clone(&self.memory_consumption),
            memory_limit: self.memory_limit,
            bucket_limit: self.bucket_limit,
        }
    }
}

impl Default for AggregationLimits {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl AggregationLimits {
    /// *memory_limit*
    /// memory_limit is defined in bytes.
    /// Reduction fails when the estimated memory consumption is higher than memory_limit.
    /// memory_limit will default to `DEFAULT_MEMORY_LIMIT` (500MB)
    ///
    /// *bucket_limit*
    /// Limits the maximum number of buckets of a reduced histogram, synthetic empty buckets
    /// included.
    /// bucket_limit will default to `DEFAULT_BUCKET_LIMIT` (65000)
    ///
    /// Note: The returned instance contains a Arc shared counter to track memory consumption.
    pub fn new(memory_limit: Option<u64>, bucket_limit: Option<u32>) -> Self {
        Self {
            memory_consumption: Default::default(),
            memory_limit: memory_limit.unwrap_or(DEFAULT_MEMORY_LIMIT).into(),
            bucket_limit: bucket_limit.unwrap_or(DEFAULT_BUCKET_LIMIT),
        }
    }

    /// Create a new ResourceLimitGuard, that will release the memory when dropped.
    pub fn new_guard(&self) -> ResourceLimitGuard {
        ResourceLimitGuard {
            memory_consumption: Arc::clone(&self.memory_consumption),
            memory_limit: self.memory_limit,
            allocated_with_the_guard: AtomicU64::new(0),
        }
    }

    /// Returns the memory currently accounted for.
    pub fn get_memory_consumed(&self) -> ByteCount {
        self.memory_consumption.load(Ordering::Relaxed).into()
    }

    /// Returns the maximum number of buckets of a reduced histogram.
    pub fn get_bucket_limit(&self) -> u32 {
        self.bucket_limit
    }

    /// Fails with `BucketLimitExceeded` if `num_buckets` is above the bucket limit.
    pub(crate) fn validate_bucket_count(&self, num_buckets: usize) -> crate::Result<()> {
        if num_buckets > self.bucket_limit as usize {
            return Err(AggregationError::BucketLimitExceeded {
                limit: self.bucket_limit,
                current: u32::try_from(num_buckets).unwrap_or(u32::MAX),
            }
            .into());
        }
        Ok(())
    }
}

fn validate_memory_consumption(
    memory_consumption: &AtomicU64,
    memory_limit: ByteCount,
) -> Result<(), AggregationError> {
    // Load the estimated memory consumed by the aggregations
    let memory_consumed: ByteCount = memory_consumption.load(Ordering::Relaxed).into();
    if memory_consumed > memory_limit {
        return Err(AggregationError::MemoryExceeded {
            limit: memory_limit,
            current: memory_consumed,
        });
    }
    Ok(())
}

/// Accounts memory against the shared counter of an [`AggregationLimits`] and gives it back
/// when dropped.
pub struct ResourceLimitGuard {
    /// The counter which is shared between the merge calls of one request.
    memory_consumption: Arc<AtomicU64>,
    /// The memory_limit in bytes
    memory_limit: ByteCount,
    /// Allocated memory with this guard.
    allocated_with_the_guard: AtomicU64,
}

impl ResourceLimitGuard {
    pub(crate) fn add_memory_consumed(&self, num_bytes: u64) -> crate::Result<()> {
        self.memory_consumption
            .fetch_add(num_bytes, Ordering::Relaxed);
        self.allocated_with_the_guard
            .fetch_add(num_bytes, Ordering::Relaxed);
        validate_memory_consumption(&self.memory_consumption, self.memory_limit)?;
        Ok(())
    }
}

impl Drop for ResourceLimitGuard {
    /// Removes the memory consumed tracked by this guard from the shared counter.
    fn drop(&mut self) {
        self.memory_consumption.fetch_sub(
            self.allocated_with_the_guard.load(Ordering::Relaxed),
            Ordering::Relaxed,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReduceError;

    #[test]
    fn test_guard_releases_memory_on_drop() {
        let limits = AggregationLimits::new(Some(1_000), None);
        {
            let guard = limits.new_guard();
            guard.add_memory_consumed(600).unwrap();
            assert_eq!(limits.get_memory_consumed(), 600u64);
            let clone = limits.clone();
            let other_guard = clone.new_guard();
            let err = other_guard.add_memory_consumed(600).unwrap_err();
            assert!(matches!(
                err,
                ReduceError::AggregationError(AggregationError::MemoryExceeded { .. })
            ));
        }
        assert_eq!(limits.get_memory_consumed(), 0u64);
    }

    #[test]
    fn test_bucket_limit() {
        let limits = AggregationLimits::new(None, Some(3));
        assert!(limits.validate_bucket_count(3).is_ok());
        let err = limits.validate_bucket_count(4).unwrap_err();
        assert!(matches!(
            err,
            ReduceError::AggregationError(AggregationError::BucketLimitExceeded {
                limit: 3,
                current: 4
            })
        ));
    }

    #[test]
    fn test_limits_from_settings() {
        let settings: ReduceSettings =
            serde_json::from_str(r#"{ "memory_limit": 2000 }"#).unwrap();
        let limits: AggregationLimits = settings.into();
        assert_eq!(limits.memory_limit, 2000u64);
        assert_eq!(limits.get_bucket_limit(), DEFAULT_BUCKET_LIMIT);
    }
}
