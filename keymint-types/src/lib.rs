//! Core type definitions for Keymint.
//!
//! This crate defines the fundamental types shared by the lifecycle engine
//! and the HTTP service:
//! - Key records and their type/status enums
//! - The health classification reported by the non-mutating status check
//!
//! Storage concerns (namespacing, pipelines) and lifecycle rules (expiry
//! policy, activation decisions) belong to `keymint-store` and
//! `keymint-core`, not here.

mod config;
mod record;
mod status;

pub use config::SystemConfig;
pub use record::{KeyRecord, KeyType, RecordFields, ValidationStatus};
pub use status::KeyStatus;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("malformed key record: {0}")]
    MalformedRecord(String),
}
