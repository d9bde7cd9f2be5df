//! Error taxonomy for the lifecycle engine.
//!
//! Every decision refusal is a distinct variant with a human-readable
//! message; only store failures collapse into a generic internal error at
//! the HTTP boundary.

use keymint_store::StoreError;
use thiserror::Error;

/// Result type for lifecycle operations.
pub type KeyResult<T> = Result<T, KeyError>;

/// Errors and refusals produced by the lifecycle engine.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The request is missing a key or carries a malformed one.
    #[error("missing or malformed key")]
    InvalidInput,

    /// No record exists for the presented key.
    #[error("key does not exist")]
    KeyNotFound,

    /// The trial key's expiry has passed.
    #[error("trial key has expired")]
    TrialExpired,

    /// The key was already consumed in its current activation cycle.
    #[error("key has already been used")]
    AlreadyUsed,

    /// The trial key is bound to a different identity.
    #[error("key is bound to a different identity")]
    IdentityMismatch,

    /// The presented identity already consumed a trial key.
    #[error("identity has already consumed a trial key")]
    TrialAlreadyConsumed,

    /// A trial key was requested without a usable duration.
    #[error("trial keys require a positive duration")]
    InvalidDuration,

    /// A stored record failed to parse.
    #[error("malformed stored record: {0}")]
    Record(#[from] keymint_types::Error),

    /// The store collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
