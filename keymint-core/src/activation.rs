//! Orchestration of the activation request variants.

use crate::error::{KeyError, KeyResult};
use crate::guard::{Decision, TrialGuard};
use chrono::{DateTime, Utc};
use keymint_store::{record_id, trial_marker_id, KeyStore, StoreOp, SYSTEM_CONFIG_ID};
use keymint_types::{KeyRecord, KeyStatus, KeyType, SystemConfig, ValidationStatus};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How long an identity marker outlives the trial it records. Bounds the
/// abuse window rather than being permanent.
pub const TRIAL_MARKER_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Rounds of reload-and-re-evaluate after a lost conditional write. A lost
/// swap means a concurrent activation moved the record to used, so the
/// second round already settles every interleaving short of an admin reset
/// racing the request.
const MAX_ACTIVATE_ROUNDS: usize = 3;

/// What an activation hands back to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationResult {
    pub key_value: String,
    pub key_type: KeyType,
    pub validation_status: ValidationStatus,
    pub expires_at: Option<DateTime<Utc>>,
    /// Operator-configured distribution link, when one is set.
    pub shortcut_link: Option<String>,
}

/// What the non-mutating status check reports.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub status: KeyStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub shortcut_link: Option<String>,
}

/// Coordinates record load, guard evaluation, and the conditional
/// activation write for each request variant.
pub struct ActivationCoordinator {
    store: Arc<dyn KeyStore>,
    guard: TrialGuard,
}

impl ActivationCoordinator {
    #[must_use]
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        let guard = TrialGuard::new(store.clone());
        Self { store, guard }
    }

    /// Activates a key, optionally binding the presented identity.
    ///
    /// The state transition is one pipelined batch: a conditional write
    /// that swaps `validation_status` from unused to used, followed by the
    /// identity marker when the flow binds one. A failed swap means a
    /// concurrent activation won; the record is reloaded and re-evaluated,
    /// which converges on the correct refusal or the idempotent success.
    pub async fn activate(
        &self,
        key_value: &str,
        identity_token: Option<&str>,
    ) -> KeyResult<ActivationResult> {
        let key_value = key_value.trim();
        if key_value.is_empty() {
            return Err(KeyError::InvalidInput);
        }
        let id = record_id(key_value);
        let mut record = self.load(&id).await?;

        for round in 0..MAX_ACTIVATE_ROUNDS {
            match self.guard.evaluate(&record, identity_token).await? {
                Decision::AlreadyActive => return self.result_for(record).await,
                Decision::Activate { bind_identity } => {
                    let now = Utc::now();
                    let mut updated = record.clone();
                    updated.validation_status = ValidationStatus::Used;
                    updated.activated_at = Some(now);
                    updated.web_validated_time = Some(now);

                    let bound_token = identity_token.filter(|_| bind_identity);
                    if let Some(token) = bound_token {
                        updated.user_id = Some(token.to_string());
                    }

                    let mut ops = vec![StoreOp::WriteRecordIf {
                        id: id.clone(),
                        guard_field: "validation_status".to_string(),
                        expected: Value::String(
                            ValidationStatus::Unused.as_str().to_string(),
                        ),
                        fields: updated.to_fields()?,
                    }];
                    if let Some(token) = bound_token {
                        ops.push(StoreOp::PutFlag {
                            id: trial_marker_id(token),
                            ttl: TRIAL_MARKER_TTL,
                        });
                    }

                    if self.store.pipeline(ops).await?.all_applied() {
                        info!(
                            key = %key_value,
                            key_type = updated.key_type.as_str(),
                            bound = bound_token.is_some(),
                            "key activated"
                        );
                        return self.result_for(updated).await;
                    }

                    debug!(key = %key_value, round, "activation swap lost, re-evaluating");
                    record = self.load(&id).await?;
                }
            }
        }

        // Only reachable when resets keep racing the activation.
        Err(KeyError::AlreadyUsed)
    }

    /// Reports a key's health without touching `validation_status`. Used
    /// by periodic client-side checks, distinct from activation.
    pub async fn check_status(&self, key_value: &str) -> KeyResult<StatusReport> {
        let key_value = key_value.trim();
        if key_value.is_empty() {
            return Err(KeyError::InvalidInput);
        }
        let Some(fields) = self.store.read_record(&record_id(key_value)).await? else {
            return Ok(StatusReport {
                status: KeyStatus::NotFound,
                expires_at: None,
                shortcut_link: None,
            });
        };
        let record = KeyRecord::from_fields(&fields)?;
        let status = KeyStatus::of_record(&record, Utc::now());
        let shortcut_link = match status {
            KeyStatus::Permanent | KeyStatus::TrialActive => self.shortcut_link().await?,
            _ => None,
        };
        Ok(StatusReport {
            status,
            expires_at: record.expires_at,
            shortcut_link,
        })
    }

    async fn load(&self, id: &str) -> KeyResult<KeyRecord> {
        let fields = self
            .store
            .read_record(id)
            .await?
            .ok_or(KeyError::KeyNotFound)?;
        Ok(KeyRecord::from_fields(&fields)?)
    }

    async fn result_for(&self, record: KeyRecord) -> KeyResult<ActivationResult> {
        let shortcut_link = self.shortcut_link().await?;
        Ok(ActivationResult {
            key_value: record.key_value,
            key_type: record.key_type,
            validation_status: record.validation_status,
            expires_at: record.expires_at,
            shortcut_link,
        })
    }

    async fn shortcut_link(&self) -> KeyResult<Option<String>> {
        let Some(fields) = self.store.read_record(SYSTEM_CONFIG_ID).await? else {
            return Ok(None);
        };
        Ok(SystemConfig::from_fields(&fields)?.shortcut_link)
    }
}
