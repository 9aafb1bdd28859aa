use super::AggregationLimits;

/// State handed to every reduce call of one request.
///
/// Cloning is cheap, the memory counter of the limits is shared between clones, so merge
/// calls running on different threads for the same request account into the same budget.
#[derive(Clone, Debug, Default)]
pub struct ReduceContext {
    limits: AggregationLimits,
}

impl ReduceContext {
    /// Creates a context reducing under the given limits.
    pub fn new(limits: AggregationLimits) -> Self {
        ReduceContext { limits }
    }

    /// The limits the reduction is accounted against.
    pub fn limits(&self) -> &AggregationLimits {
        &self.limits
    }
}
