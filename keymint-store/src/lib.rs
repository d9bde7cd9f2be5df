//! Key-value store boundary for Keymint.
//!
//! The engine talks to its store through the [`KeyStore`] trait: a flat
//! namespace of hash-records and TTL-bearing flags addressable by string
//! id. The trait captures exactly the primitives the lifecycle engine
//! relies on: existence checks, whole-record reads and writes, a
//! conditional write that compare-and-swaps on a single guard field, flag
//! put/check, prefix scans, and a best-effort ordered pipeline.
//!
//! Pipelines batch several operations into one submission. They apply in
//! order and a failed conditional-write guard halts the batch, but there
//! is **no isolation across concurrent pipelines**; the conditional write
//! is the only linearization primitive callers may rely on.
//!
//! [`MemoryStore`] implements the contract in process memory; remote
//! implementations live behind the same trait.

mod error;
mod memory;
mod namespace;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use namespace::{
    record_id, trial_marker_id, RECORD_PREFIX, SYSTEM_CONFIG_ID, TRIAL_MARKER_PREFIX,
};
pub use store::{KeyStore, PipelineReceipt, StoreOp};
