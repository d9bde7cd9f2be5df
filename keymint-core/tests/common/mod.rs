//! Shared test helpers for lifecycle tests.

#![allow(dead_code)]

use keymint_core::{ActivationCoordinator, ExpiryPolicy, KeyLifecycle};
use keymint_store::MemoryStore;
use keymint_types::{KeyRecord, KeyType};
use std::sync::Arc;

/// A fresh in-memory store shared by engine components.
pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Lifecycle and coordinator wired to the same store.
pub fn engine(store: &Arc<MemoryStore>) -> (KeyLifecycle, ActivationCoordinator) {
    let store: Arc<dyn keymint_store::KeyStore> = store.clone();
    (
        KeyLifecycle::new(store.clone()),
        ActivationCoordinator::new(store),
    )
}

/// Issues one key of the given type, panicking on under-delivery (an empty
/// in-memory store never collides five times in a row).
pub async fn issue_one(
    lifecycle: &KeyLifecycle,
    key_type: KeyType,
    policy: ExpiryPolicy,
) -> KeyRecord {
    lifecycle
        .issue(key_type, policy)
        .await
        .unwrap()
        .expect("issuance should not under-deliver on an empty store")
}

/// An opaque identity token, the shape clients mint on first launch.
pub fn identity_token() -> String {
    uuid::Uuid::new_v4().to_string()
}
