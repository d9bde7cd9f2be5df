//! In-process implementation of the store contract.
//!
//! Backs the server's default single-node mode and the test suites. One
//! `RwLock` guards the whole namespace, so a pipeline applies atomically
//! here; remote implementations only promise the ordered, guard-halting
//! behavior documented on [`KeyStore::pipeline`].

use crate::error::StoreResult;
use crate::store::{KeyStore, PipelineReceipt, StoreOp};
use async_trait::async_trait;
use keymint_types::RecordFields;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    records: HashMap<String, RecordFields>,
    /// Flag id to expiry deadline.
    flags: HashMap<String, Instant>,
}

impl Inner {
    fn flag_live(&self, id: &str, now: Instant) -> bool {
        self.flags.get(id).is_some_and(|deadline| *deadline > now)
    }

    /// Applies one op; returns false when a conditional guard failed.
    fn apply(&mut self, op: StoreOp, now: Instant) -> bool {
        match op {
            StoreOp::WriteRecord { id, fields } => {
                self.records.insert(id, fields);
                true
            }
            StoreOp::WriteRecordIf {
                id,
                guard_field,
                expected,
                fields,
            } => {
                let guard_holds = self
                    .records
                    .get(&id)
                    .and_then(|record| record.get(&guard_field))
                    .is_some_and(|current| *current == expected);
                if guard_holds {
                    self.records.insert(id, fields);
                }
                guard_holds
            }
            StoreOp::PutFlag { id, ttl } => {
                self.flags.insert(id, now + ttl);
                true
            }
            StoreOp::Delete { id } => {
                self.records.remove(&id);
                self.flags.remove(&id);
                true
            }
        }
    }
}

/// An in-memory [`KeyStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryStore {
    async fn exists(&self, id: &str) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.records.contains_key(id) || inner.flag_live(id, Instant::now()))
    }

    async fn read_record(&self, id: &str) -> StoreResult<Option<RecordFields>> {
        Ok(self.inner.read().await.records.get(id).cloned())
    }

    async fn write_record(&self, id: &str, fields: RecordFields) -> StoreResult<()> {
        self.inner.write().await.records.insert(id.to_string(), fields);
        Ok(())
    }

    async fn write_record_if(
        &self,
        id: &str,
        guard_field: &str,
        expected: &Value,
        fields: RecordFields,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.apply(
            StoreOp::WriteRecordIf {
                id: id.to_string(),
                guard_field: guard_field.to_string(),
                expected: expected.clone(),
                fields,
            },
            Instant::now(),
        ))
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.records.remove(id);
        inner.flags.remove(id);
        Ok(())
    }

    async fn list_ids(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let inner = self.inner.read().await;
        let now = Instant::now();
        let mut ids: Vec<String> = inner
            .records
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .chain(
                inner
                    .flags
                    .keys()
                    .filter(|id| id.starts_with(prefix) && inner.flag_live(id, now))
                    .cloned(),
            )
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn put_flag(&self, id: &str, ttl: Duration) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.flags.insert(id.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn flag_exists(&self, id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.flags.get(id) {
            Some(deadline) if *deadline > Instant::now() => Ok(true),
            // Expired entry: evict it so the namespace does not accumulate.
            Some(_) => {
                inner.flags.remove(id);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn pipeline(&self, ops: Vec<StoreOp>) -> StoreResult<PipelineReceipt> {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let mut applied = 0;
        for (index, op) in ops.into_iter().enumerate() {
            if !inner.apply(op, now) {
                return Ok(PipelineReceipt {
                    applied,
                    halted_at: Some(index),
                });
            }
            applied += 1;
        }
        Ok(PipelineReceipt {
            applied,
            halted_at: None,
        })
    }
}
