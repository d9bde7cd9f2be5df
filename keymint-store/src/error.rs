//! Error types for the store boundary.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur talking to the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the operation failed in transit.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with something the client cannot interpret.
    #[error("store protocol error: {0}")]
    Protocol(String),
}
