mod bounds;
mod bucket;
mod empty_bucket_info;
mod gap_fill;
#[allow(clippy::module_inception)]
mod histogram;
mod order;

pub use bounds::ExtendedBounds;
pub use bucket::HistogramBucket;
pub use empty_bucket_info::EmptyBucketInfo;
pub use histogram::InternalHistogram;
pub use order::HistogramOrder;
