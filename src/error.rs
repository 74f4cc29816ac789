//! Error taxonomy for table operations.

use thiserror::Error;

/// Failure returned by a table operation. A failed call leaves the table
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// `insert` was called with a key that is already stored.
    #[error("key {key} is already present in the table")]
    AlreadyPresent { key: i64 },

    /// `remove` was called with a key that is not stored.
    #[error("key {key} is not present in the table")]
    KeyNotFound { key: i64 },

    /// Malformed call arguments: a negative key or an unusable config.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Memory for entries, a grown bucket array or flush output could not
    /// be obtained. `requested` is the element count that was asked for.
    #[error("allocation failed: requested {requested} elements")]
    AllocationFailure { requested: usize },
}

impl TableError {
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn allocation_failure(requested: usize) -> Self {
        Self::AllocationFailure { requested }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
