use serde::{Deserialize, Serialize};

use super::IntermediateStats;

/// Intermediate result of the average aggregation that can be combined with other intermediate
/// results.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntermediateAverage {
    pub(crate) stats: IntermediateStats,
}

impl IntermediateAverage {
    /// Creates a new [`IntermediateAverage`] instance from collected stats.
    pub fn from_stats(stats: IntermediateStats) -> Self {
        Self { stats }
    }
    /// Merges the other intermediate result into self.
    pub fn merge_fruits(&mut self, other: IntermediateAverage) {
        self.stats.merge_fruits(other.stats);
    }
    /// Computes the final average value.
    pub fn finalize(&self) -> Option<f64> {
        self.stats.finalize().avg
    }
}

/// Intermediate result of the value count aggregation that can be combined with other
/// intermediate results.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntermediateCount {
    pub(crate) stats: IntermediateStats,
}

impl IntermediateCount {
    /// Creates a new [`IntermediateCount`] instance from collected stats.
    pub fn from_stats(stats: IntermediateStats) -> Self {
        Self { stats }
    }
    /// Merges the other intermediate result into self.
    pub fn merge_fruits(&mut self, other: IntermediateCount) {
        self.stats.merge_fruits(other.stats);
    }
    /// Computes the final count.
    pub fn finalize(&self) -> Option<f64> {
        Some(self.stats.finalize().count as f64)
    }
}

/// Intermediate result of the maximum aggregation that can be combined with other intermediate
/// results.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntermediateMax {
    pub(crate) stats: IntermediateStats,
}

impl IntermediateMax {
    /// Creates a new [`IntermediateMax`] instance from collected stats.
    pub fn from_stats(stats: IntermediateStats) -> Self {
        Self { stats }
    }
    /// Merges the other intermediate result into self.
    pub fn merge_fruits(&mut self, other: IntermediateMax) {
        self.stats.merge_fruits(other.stats);
    }
    /// Computes the final maximum value.
    pub fn finalize(&self) -> Option<f64> {
        self.stats.finalize().max
    }
}

/// Intermediate result of the minimum aggregation that can be combined with other intermediate
/// results.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntermediateMin {
    pub(crate) stats: IntermediateStats,
}

impl IntermediateMin {
    /// Creates a new [`IntermediateMin`] instance from collected stats.
    pub fn from_stats(stats: IntermediateStats) -> Self {
        Self { stats }
    }
    /// Merges the other intermediate result into self.
    pub fn merge_fruits(&mut self, other: IntermediateMin) {
        self.stats.merge_fruits(other.stats);
    }
    /// Computes the final minimum value.
    pub fn finalize(&self) -> Option<f64> {
        self.stats.finalize().min
    }
}

/// Intermediate result of the sum aggregation that can be combined with other intermediate
/// results.
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntermediateSum {
    pub(crate) stats: IntermediateStats,
}

impl IntermediateSum {
    /// Creates a new [`IntermediateSum`] instance from collected stats.
    pub fn from_stats(stats: IntermediateStats) -> Self {
        Self { stats }
    }
    /// Merges the other intermediate result into self.
    pub fn merge_fruits(&mut self, other: IntermediateSum) {
        self.stats.merge_fruits(other.stats);
    }
    /// Computes the final sum.
    pub fn finalize(&self) -> Option<f64> {
        Some(self.stats.finalize().sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value_finalize() {
        let stats = IntermediateStats::from_values(&[2.0, 4.0]);
        assert_eq!(IntermediateAverage::from_stats(stats.clone()).finalize(), Some(3.0));
        assert_eq!(IntermediateCount::from_stats(stats.clone()).finalize(), Some(2.0));
        assert_eq!(IntermediateMax::from_stats(stats.clone()).finalize(), Some(4.0));
        assert_eq!(IntermediateMin::from_stats(stats.clone()).finalize(), Some(2.0));
        assert_eq!(IntermediateSum::from_stats(stats).finalize(), Some(6.0));

        assert_eq!(IntermediateMin::default().finalize(), None);
        assert_eq!(IntermediateSum::default().finalize(), Some(0.0));
        assert_eq!(IntermediateCount::default().finalize(), Some(0.0));
    }

    #[test]
    fn test_single_value_merge() {
        let mut avg = IntermediateAverage::from_stats(IntermediateStats::from_values(&[1.0]));
        avg.merge_fruits(IntermediateAverage::from_stats(IntermediateStats::from_values(&[
            2.0, 6.0,
        ])));
        assert_eq!(avg.finalize(), Some(3.0));
    }
}
