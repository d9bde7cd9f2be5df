mod common;

use common::{engine, identity_token, issue_one, memory_store};
use keymint_core::{ActivationCoordinator, ExpiryPolicy, KeyError, KeyLifecycle};
use keymint_store::{record_id, trial_marker_id, KeyStore, SYSTEM_CONFIG_ID};
use keymint_types::{KeyRecord, KeyStatus, KeyType, SystemConfig, ValidationStatus};
use std::sync::Arc;

async fn stored_record(store: &dyn KeyStore, key_value: &str) -> KeyRecord {
    let fields = store.read_record(&record_id(key_value)).await.unwrap().unwrap();
    KeyRecord::from_fields(&fields).unwrap()
}

// ── Input validation ─────────────────────────────────────────────

#[tokio::test]
async fn blank_key_is_invalid_input() {
    let store = memory_store();
    let (_, coordinator) = engine(&store);
    for key in ["", "   "] {
        let result = coordinator.activate(key, None).await;
        assert!(matches!(result, Err(KeyError::InvalidInput)));
    }
}

#[tokio::test]
async fn unknown_key_is_not_found() {
    let store = memory_store();
    let (_, coordinator) = engine(&store);
    let result = coordinator.activate("MSKnothere", None).await;
    assert!(matches!(result, Err(KeyError::KeyNotFound)));
}

#[tokio::test]
async fn key_is_trimmed_before_lookup() {
    let store = memory_store();
    let (lifecycle, coordinator) = engine(&store);
    let record = issue_one(&lifecycle, KeyType::Permanent, ExpiryPolicy::none()).await;

    let padded = format!("  {}  ", record.key_value);
    let result = coordinator.activate(&padded, None).await.unwrap();
    assert_eq!(result.key_value, record.key_value);
}

// ── Permanent keys ───────────────────────────────────────────────

#[tokio::test]
async fn permanent_key_activates_and_revalidates() {
    let store = memory_store();
    let (lifecycle, coordinator) = engine(&store);
    let record = issue_one(&lifecycle, KeyType::Permanent, ExpiryPolicy::none()).await;

    let first = coordinator.activate(&record.key_value, None).await.unwrap();
    assert_eq!(first.validation_status, ValidationStatus::Used);

    // Activating an already-used permanent key is an idempotent success.
    let second = coordinator.activate(&record.key_value, None).await.unwrap();
    assert_eq!(second.validation_status, ValidationStatus::Used);
    assert_eq!(second.key_value, first.key_value);

    let stored = stored_record(store.as_ref(), &record.key_value).await;
    assert!(stored.activated_at.is_some());
    assert_eq!(stored.activated_at, stored.web_validated_time);
    assert!(stored.user_id.is_none());
}

// ── Trial expiry ─────────────────────────────────────────────────

#[tokio::test]
async fn instantly_expired_trial_is_refused() {
    // duration_minutes = 0 issues a key that is already past expiry.
    let store = memory_store();
    let (lifecycle, coordinator) = engine(&store);
    let record = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::minutes(0)).await;

    let result = coordinator.activate(&record.key_value, None).await;
    assert!(matches!(result, Err(KeyError::TrialExpired)));

    // Expiry dominates even though the record is still unused.
    let stored = stored_record(store.as_ref(), &record.key_value).await;
    assert_eq!(stored.validation_status, ValidationStatus::Unused);
}

// ── Web-only trial flow ──────────────────────────────────────────

#[tokio::test]
async fn web_only_trial_activation_binds_nothing() {
    let store = memory_store();
    let (lifecycle, coordinator) = engine(&store);
    let record = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::days(7)).await;

    let result = coordinator.activate(&record.key_value, None).await.unwrap();
    assert_eq!(result.validation_status, ValidationStatus::Used);

    let stored = stored_record(store.as_ref(), &record.key_value).await;
    assert!(stored.user_id.is_none());

    // A second web-only attempt is a refusal, not an idempotent success.
    let again = coordinator.activate(&record.key_value, None).await;
    assert!(matches!(again, Err(KeyError::AlreadyUsed)));
}

// ── Identity-bound trial flow ────────────────────────────────────

#[tokio::test]
async fn one_trial_per_identity_end_to_end() {
    let store = memory_store();
    let (lifecycle, coordinator) = engine(&store);
    let key_a = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::days(7)).await;
    let key_b = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::days(7)).await;
    let x = identity_token();
    let y = identity_token();

    // X consumes trial A; the binding and the marker are written together.
    coordinator.activate(&key_a.key_value, Some(&x)).await.unwrap();
    let stored = stored_record(store.as_ref(), &key_a.key_value).await;
    assert_eq!(stored.user_id.as_deref(), Some(x.as_str()));
    assert!(store.flag_exists(&trial_marker_id(&x)).await.unwrap());

    // X cannot consume a different trial key.
    let second_trial = coordinator.activate(&key_b.key_value, Some(&x)).await;
    assert!(matches!(second_trial, Err(KeyError::TrialAlreadyConsumed)));

    // X re-validating its own key is an idempotent success.
    let again = coordinator.activate(&key_a.key_value, Some(&x)).await.unwrap();
    assert_eq!(again.validation_status, ValidationStatus::Used);

    // Y presenting X's key is refused as sharing.
    let shared = coordinator.activate(&key_a.key_value, Some(&y)).await;
    assert!(matches!(shared, Err(KeyError::IdentityMismatch)));

    // Y never got a marker out of the refusals.
    assert!(!store.flag_exists(&trial_marker_id(&y)).await.unwrap());
}

#[tokio::test]
async fn reset_reopens_the_activation_cycle() {
    let store = memory_store();
    let (lifecycle, coordinator) = engine(&store);
    let record = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::days(7)).await;
    let x = identity_token();
    let y = identity_token();

    coordinator.activate(&record.key_value, Some(&x)).await.unwrap();
    lifecycle.reset(&record.key_value).await.unwrap();

    // The cycle reopened: a different identity may claim the key as if
    // freshly issued. X's marker is untouched by the reset.
    let reclaimed = coordinator.activate(&record.key_value, Some(&y)).await.unwrap();
    assert_eq!(reclaimed.validation_status, ValidationStatus::Used);
    let stored = stored_record(store.as_ref(), &record.key_value).await;
    assert_eq!(stored.user_id.as_deref(), Some(y.as_str()));
    assert!(store.flag_exists(&trial_marker_id(&x)).await.unwrap());
}

// ── Concurrency ──────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_activations_elect_exactly_one_winner() {
    let store = memory_store();
    let (lifecycle, coordinator) = engine(&store);
    let record = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::days(7)).await;
    let coordinator = Arc::new(coordinator);

    let identities: Vec<String> = (0..8).map(|_| identity_token()).collect();
    let mut handles = Vec::new();
    for identity in &identities {
        let coordinator = coordinator.clone();
        let key_value = record.key_value.clone();
        let identity = identity.clone();
        handles.push(tokio::spawn(async move {
            coordinator.activate(&key_value, Some(&identity)).await
        }));
    }

    let mut successes = 0;
    let mut refusals = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => {
                successes += 1;
                assert_eq!(result.validation_status, ValidationStatus::Used);
            }
            Err(KeyError::IdentityMismatch | KeyError::AlreadyUsed) => refusals += 1,
            Err(other) => panic!("unexpected refusal: {other}"),
        }
    }
    assert_eq!(successes, 1, "the conditional write must elect one winner");
    assert_eq!(refusals, identities.len() - 1);

    // Exactly one identity was bound and exactly one marker planted.
    let stored = stored_record(store.as_ref(), &record.key_value).await;
    let bound = stored.user_id.expect("winner must be bound");
    assert!(identities.contains(&bound));
    let mut markers = 0;
    for identity in &identities {
        if store.flag_exists(&trial_marker_id(identity)).await.unwrap() {
            assert_eq!(*identity, bound);
            markers += 1;
        }
    }
    assert_eq!(markers, 1);
}

// ── Status check ─────────────────────────────────────────────────

#[tokio::test]
async fn status_check_reports_without_mutating() {
    let store = memory_store();
    let (lifecycle, coordinator) = engine(&store);

    let missing = coordinator.check_status("MSKmissing").await.unwrap();
    assert_eq!(missing.status, KeyStatus::NotFound);

    let permanent = issue_one(&lifecycle, KeyType::Permanent, ExpiryPolicy::none()).await;
    let report = coordinator.check_status(&permanent.key_value).await.unwrap();
    assert_eq!(report.status, KeyStatus::Permanent);

    let trial = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::days(7)).await;
    let unactivated = coordinator.check_status(&trial.key_value).await.unwrap();
    assert_eq!(unactivated.status, KeyStatus::Invalid);

    // The checks above wrote nothing.
    let stored = stored_record(store.as_ref(), &trial.key_value).await;
    assert_eq!(stored.validation_status, ValidationStatus::Unused);

    coordinator.activate(&trial.key_value, None).await.unwrap();
    let active = coordinator.check_status(&trial.key_value).await.unwrap();
    assert_eq!(active.status, KeyStatus::TrialActive);
    assert_eq!(active.expires_at, trial.expires_at);

    let expired = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::minutes(0)).await;
    let report = coordinator.check_status(&expired.key_value).await.unwrap();
    assert_eq!(report.status, KeyStatus::TrialExpired);
    assert!(report.shortcut_link.is_none());
}

#[tokio::test]
async fn activation_returns_the_distribution_link() {
    let store = memory_store();
    let (lifecycle, coordinator) = engine(&store);
    let config = SystemConfig {
        shortcut_link: Some("https://example.com/get".into()),
        doc_link: None,
    };
    store
        .write_record(SYSTEM_CONFIG_ID, config.to_fields().unwrap())
        .await
        .unwrap();

    let record = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::days(7)).await;
    let result = coordinator.activate(&record.key_value, None).await.unwrap();
    assert_eq!(result.shortcut_link.as_deref(), Some("https://example.com/get"));

    let report = coordinator.check_status(&record.key_value).await.unwrap();
    assert_eq!(report.status, KeyStatus::TrialActive);
    assert_eq!(report.shortcut_link.as_deref(), Some("https://example.com/get"));
}

// ── Engine wiring ────────────────────────────────────────────────

#[tokio::test]
async fn coordinator_and_lifecycle_share_state_through_the_store() {
    // Independent component instances over one store behave like separate
    // request handlers: no shared process memory.
    let store = memory_store();
    let shared: Arc<dyn KeyStore> = store.clone();
    let lifecycle = KeyLifecycle::new(shared.clone());
    let handler_a = ActivationCoordinator::new(shared.clone());
    let handler_b = ActivationCoordinator::new(shared);

    let record = issue_one(&lifecycle, KeyType::Trial, ExpiryPolicy::days(7)).await;
    handler_a.activate(&record.key_value, None).await.unwrap();
    let result = handler_b.activate(&record.key_value, None).await;
    assert!(matches!(result, Err(KeyError::AlreadyUsed)));
}
