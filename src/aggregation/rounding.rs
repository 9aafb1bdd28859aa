//! Rounding of values to histogram bucket keys.

use super::streams::{StreamInput, StreamOutput, Streamable};
use crate::ReduceError;

const INTERVAL_ID: u8 = 0;
const PRE_POST_ID: u8 = 8;

/// Maps a value to the key of its bucket, and a bucket key to the key of the following bucket.
///
/// A rounding is monotonic, and idempotent on bucket keys: `round(round(v)) == round(v)`.
/// `next_rounding_value` is only ever called with bucket keys, and moves strictly forward
/// unless the end of the `i64` key space is reached, where it saturates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rounding {
    /// Fixed size buckets `[k * interval, (k + 1) * interval)`.
    Interval(Interval),
    /// Shifts the values before rounding them with `inner`, and shifts the resulting keys
    /// afterwards.
    PrePost {
        /// Added to the value before rounding.
        pre_offset: i64,
        /// Added to the key after rounding.
        post_offset: i64,
        /// The rounding applied on the shifted value.
        inner: Box<Rounding>,
    },
}

/// Width of the buckets of an interval rounding. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval(i64);

impl Interval {
    /// Fails if `interval` is not positive.
    pub fn new(interval: i64) -> crate::Result<Interval> {
        if interval <= 0 {
            return Err(ReduceError::InvalidArgument(format!(
                "interval must be a positive value, got {interval}"
            )));
        }
        Ok(Interval(interval))
    }

    /// The width as a number.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl Rounding {
    /// Fixed interval rounding. `interval` has to be positive.
    pub fn interval(interval: i64) -> crate::Result<Rounding> {
        Interval::new(interval).map(Rounding::Interval)
    }

    /// Wraps `inner` with offsets applied before and after rounding.
    pub fn pre_post(inner: Rounding, pre_offset: i64, post_offset: i64) -> Rounding {
        Rounding::PrePost {
            pre_offset,
            post_offset,
            inner: Box::new(inner),
        }
    }

    /// Returns the key of the bucket `value` falls into.
    pub fn round(&self, value: i64) -> i64 {
        match self {
            Rounding::Interval(interval) => {
                value.saturating_sub(value.rem_euclid(interval.get()))
            }
            Rounding::PrePost {
                pre_offset,
                post_offset,
                inner,
            } => inner
                .round(value.saturating_add(*pre_offset))
                .saturating_add(*post_offset),
        }
    }

    /// Returns the key of the bucket following the bucket with key `key`.
    pub fn next_rounding_value(&self, key: i64) -> i64 {
        match self {
            Rounding::Interval(interval) => key.saturating_add(interval.get()),
            Rounding::PrePost {
                post_offset, inner, ..
            } => inner
                .next_rounding_value(key.saturating_sub(*post_offset))
                .saturating_add(*post_offset),
        }
    }
}

impl Streamable for Rounding {
    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()> {
        match self {
            Rounding::Interval(interval) => {
                output.write(&INTERVAL_ID)?;
                output.write_vint(interval.get().unsigned_abs())?;
            }
            Rounding::PrePost {
                pre_offset,
                post_offset,
                inner,
            } => {
                output.write(&PRE_POST_ID)?;
                inner.write_to(output)?;
                output.write(pre_offset)?;
                output.write(post_offset)?;
            }
        }
        Ok(())
    }

    fn read_from(input: &mut StreamInput<'_>) -> crate::Result<Self> {
        let id: u8 = input.read()?;
        match id {
            INTERVAL_ID => {
                let interval = i64::try_from(input.read_vint()?).map_err(|_| {
                    ReduceError::ProtocolError("rounding interval out of range".to_string())
                })?;
                Rounding::interval(interval)
                    .map_err(|err| ReduceError::ProtocolError(err.to_string()))
            }
            PRE_POST_ID => {
                let inner = Rounding::read_from(input)?;
                let pre_offset = input.read()?;
                let post_offset = input.read()?;
                Ok(Rounding::pre_post(inner, pre_offset, post_offset))
            }
            _ => Err(ReduceError::ProtocolError(format!(
                "unknown rounding id [{id}]"
            ))),
        }
    }
}
