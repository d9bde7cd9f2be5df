//! The store trait and pipeline operations.

use crate::error::StoreResult;
use async_trait::async_trait;
use keymint_types::RecordFields;
use serde_json::Value;
use std::time::Duration;

/// One operation inside a pipelined batch.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Unconditionally write a full hash-record.
    WriteRecord {
        id: String,
        fields: RecordFields,
    },
    /// Write a full hash-record only if `guard_field` currently equals
    /// `expected`. A record that is absent, or whose guard field differs,
    /// fails the guard and halts the rest of the batch.
    WriteRecordIf {
        id: String,
        guard_field: String,
        expected: Value,
        fields: RecordFields,
    },
    /// Set a sentinel flag that expires after `ttl`.
    PutFlag {
        id: String,
        ttl: Duration,
    },
    /// Remove an id. Removing an absent id is not an error.
    Delete {
        id: String,
    },
}

/// What a pipeline actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReceipt {
    /// Number of operations applied, in order from the front.
    pub applied: usize,
    /// Index of the conditional write whose guard failed, if any.
    /// Operations after it were not attempted.
    pub halted_at: Option<usize>,
}

impl PipelineReceipt {
    /// Returns true if every operation in the batch was applied.
    #[must_use]
    pub fn all_applied(&self) -> bool {
        self.halted_at.is_none()
    }
}

/// Abstract key-value store interface.
///
/// A flat namespace of hash-records and TTL flags. Individual operations
/// are atomic; [`KeyStore::pipeline`] batches operations into one
/// submission, applied in order and halted by a failed conditional-write
/// guard, but without isolation from concurrently submitted pipelines.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Returns whether any entity exists under the id.
    async fn exists(&self, id: &str) -> StoreResult<bool>;

    /// Reads a full hash-record, or `None` if absent.
    async fn read_record(&self, id: &str) -> StoreResult<Option<RecordFields>>;

    /// Writes a full hash-record, replacing any previous value.
    async fn write_record(&self, id: &str, fields: RecordFields) -> StoreResult<()>;

    /// Conditionally replaces a record: applies only if it exists and its
    /// `guard_field` equals `expected`. Returns whether the write applied.
    async fn write_record_if(
        &self,
        id: &str,
        guard_field: &str,
        expected: &Value,
        fields: RecordFields,
    ) -> StoreResult<bool>;

    /// Removes an id. Removing an absent id is not an error.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Lists all ids under a prefix, sorted.
    async fn list_ids(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Sets a sentinel flag that expires after `ttl`.
    async fn put_flag(&self, id: &str, ttl: Duration) -> StoreResult<()>;

    /// Returns whether a flag exists and has not expired.
    async fn flag_exists(&self, id: &str) -> StoreResult<bool>;

    /// Submits a batch of operations in one round trip.
    async fn pipeline(&self, ops: Vec<StoreOp>) -> StoreResult<PipelineReceipt>;
}
