use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::ReduceError;
use crate::aggregation::Rounding;
use crate::aggregation::streams::{StreamInput, StreamOutput, Streamable};

/// Can be set to extend the bounds of a histogram. The range of the buckets is by default
/// defined by the data range of the values of the documents. As the name suggests, this can
/// only be used to extend the value range: empty buckets are added from `min` up to the first
/// bucket, and from the last bucket up to `max`.
///
/// Only used when `min_doc_count` is 0, since the empty buckets would be filtered otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedBounds {
    /// The lower bound.
    pub min: Option<i64>,
    /// The upper bound.
    pub max: Option<i64>,
}

impl Display for ExtendedBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_bound = |bound: Option<i64>| bound.map(|b| b.to_string()).unwrap_or_default();
        write!(f, "[{},{}]", fmt_bound(self.min), fmt_bound(self.max))
    }
}

impl ExtendedBounds {
    /// Creates new bounds.
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        ExtendedBounds { min, max }
    }

    /// Checks that `min` is not greater than `max`.
    pub fn validate(&self) -> crate::Result<()> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(ReduceError::InvalidArgument(format!(
                    "[extended_bounds.min][{min}] cannot be greater than \
                     [extended_bounds.max][{max}]"
                )));
            }
        }
        Ok(())
    }

    /// Rounds both bounds to bucket keys, so that the gap filling walks on the same grid as the
    /// data.
    pub fn round(&self, rounding: &Rounding) -> ExtendedBounds {
        ExtendedBounds {
            min: self.min.map(|min| rounding.round(min)),
            max: self.max.map(|max| rounding.round(max)),
        }
    }
}

impl Streamable for ExtendedBounds {
    fn write_to(&self, output: &mut StreamOutput) -> crate::Result<()> {
        for bound in [self.min, self.max] {
            output.write(&bound.is_some())?;
            if let Some(bound) = bound {
                output.write(&bound)?;
            }
        }
        Ok(())
    }

    fn read_from(input: &mut StreamInput<'_>) -> crate::Result<Self> {
        let mut read_bound = || -> crate::Result<Option<i64>> {
            if input.read::<bool>()? {
                Ok(Some(input.read::<i64>()?))
            } else {
                Ok(None)
            }
        };
        let min = read_bound()?;
        let max = read_bound()?;
        Ok(ExtendedBounds { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        assert!(ExtendedBounds::new(Some(0), Some(10)).validate().is_ok());
        assert!(ExtendedBounds::new(Some(10), None).validate().is_ok());
        assert!(ExtendedBounds::new(None, None).validate().is_ok());
        let err = ExtendedBounds::new(Some(11), Some(10)).validate().unwrap_err();
        assert!(matches!(err, ReduceError::InvalidArgument(_)));
    }

    #[test]
    fn test_round_bounds() {
        let rounding = Rounding::interval(5).unwrap();
        assert_eq!(
            ExtendedBounds::new(Some(-3), Some(12)).round(&rounding),
            ExtendedBounds::new(Some(-5), Some(10))
        );
        assert_eq!(
            ExtendedBounds::new(None, Some(4)).round(&rounding),
            ExtendedBounds::new(None, Some(0))
        );
    }

    #[test]
    fn test_display_bounds() {
        assert_eq!(ExtendedBounds::new(Some(-1), None).to_string(), "[-1,]");
    }
}
