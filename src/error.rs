//! Definition of the library's error and result.

use std::io;

use thiserror::Error;

use crate::aggregation::AggregationError;

/// The library's failure based error enum
#[derive(Debug, Error)]
pub enum ReduceError {
    /// A limit or a data consistency check of the reduction was violated.
    #[error("An error occurred in an aggregation: {0}")]
    AggregationError(#[from] AggregationError),
    /// Malformed or version-incompatible wire data.
    #[error("Protocol error: '{0}'")]
    ProtocolError(String),
    /// Invalid argument was passed by the user.
    #[error("An invalid argument was passed: '{0}'")]
    InvalidArgument(String),
    /// A contract between the reducer and its caller was broken.
    #[error("Invariant violation: '{0}'")]
    InvariantViolation(String),
}

impl From<io::Error> for ReduceError {
    fn from(io_error: io::Error) -> ReduceError {
        ReduceError::ProtocolError(format!("failed to read stream: {io_error}"))
    }
}
