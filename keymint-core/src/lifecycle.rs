//! Issue, reset, and delete operations on key records.

use crate::error::{KeyError, KeyResult};
use crate::generator;
use chrono::{DateTime, Duration, Utc};
use keymint_store::{record_id, KeyStore, StoreOp};
use keymint_types::{KeyRecord, KeyType, ValidationStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Trial duration requested at issuance.
///
/// The minute granularity is the diagnostic path and takes precedence when
/// present and non-negative; zero minutes issues an instantly-expired key.
/// The day granularity is the normal path and must be strictly positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub duration_days: Option<i64>,
    pub duration_minutes: Option<i64>,
}

impl ExpiryPolicy {
    /// No duration; what permanent keys are issued with.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            duration_days: None,
            duration_minutes: None,
        }
    }

    /// A day-granularity trial duration.
    #[must_use]
    pub const fn days(days: i64) -> Self {
        Self {
            duration_days: Some(days),
            duration_minutes: None,
        }
    }

    /// A minute-granularity trial duration.
    #[must_use]
    pub const fn minutes(minutes: i64) -> Self {
        Self {
            duration_days: None,
            duration_minutes: Some(minutes),
        }
    }

    /// Computes the expiry for a key issued now.
    ///
    /// Permanent keys never expire. Trial keys take the minute duration
    /// when it is present and non-negative, else a positive day duration,
    /// else the issuance fails with `InvalidDuration`.
    pub fn expires_at(
        &self,
        key_type: KeyType,
        now: DateTime<Utc>,
    ) -> KeyResult<Option<DateTime<Utc>>> {
        if !key_type.is_trial() {
            return Ok(None);
        }
        if let Some(minutes) = self.duration_minutes {
            if minutes >= 0 {
                return Ok(Some(now + Duration::minutes(minutes)));
            }
        }
        match self.duration_days {
            Some(days) if days > 0 => Ok(Some(now + Duration::days(days))),
            _ => Err(KeyError::InvalidDuration),
        }
    }
}

/// Owns the unused→used cycle boundaries: issuance, reset, deletion.
pub struct KeyLifecycle {
    store: Arc<dyn KeyStore>,
}

impl KeyLifecycle {
    #[must_use]
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Issues one key, or `None` when collision attempts were exhausted.
    pub async fn issue(
        &self,
        key_type: KeyType,
        policy: ExpiryPolicy,
    ) -> KeyResult<Option<KeyRecord>> {
        let now = Utc::now();
        let expires_at = policy.expires_at(key_type, now)?;
        let Some(key_value) = generator::generate_unique(self.store.as_ref(), key_type).await?
        else {
            return Ok(None);
        };
        let record = KeyRecord::new(key_value, key_type, now, expires_at);
        self.store
            .write_record(&record_id(&record.key_value), record.to_fields()?)
            .await?;
        debug!(key = %record.key_value, key_type = key_type.as_str(), "issued key");
        Ok(Some(record))
    }

    /// Issues up to `quantity` keys; may under-deliver when the namespace
    /// keeps colliding.
    pub async fn issue_batch(
        &self,
        quantity: usize,
        key_type: KeyType,
        policy: ExpiryPolicy,
    ) -> KeyResult<Vec<KeyRecord>> {
        // Validate the duration once up front so a bad request fails
        // instead of delivering zero keys.
        policy.expires_at(key_type, Utc::now())?;

        let mut issued = Vec::with_capacity(quantity);
        for _ in 0..quantity {
            if let Some(record) = self.issue(key_type, policy).await? {
                issued.push(record);
            }
        }
        if issued.len() < quantity {
            warn!(
                requested = quantity,
                issued = issued.len(),
                "batch issuance under-delivered"
            );
        }
        Ok(issued)
    }

    /// Returns a key to the unused state, clearing the activation
    /// timestamps and the identity binding: the record re-enters a fresh
    /// activation cycle.
    pub async fn reset(&self, key_value: &str) -> KeyResult<()> {
        let id = record_id(key_value);
        let fields = self
            .store
            .read_record(&id)
            .await?
            .ok_or(KeyError::KeyNotFound)?;
        let mut record = KeyRecord::from_fields(&fields)?;
        record.validation_status = ValidationStatus::Unused;
        record.activated_at = None;
        record.web_validated_time = None;
        record.user_id = None;
        self.store.write_record(&id, record.to_fields()?).await?;
        info!(key = %key_value, "key reset to unused");
        Ok(())
    }

    /// Removes a key. Removing an absent key is not an error.
    pub async fn delete(&self, key_value: &str) -> KeyResult<()> {
        self.store.delete(&record_id(key_value)).await?;
        info!(key = %key_value, "key deleted");
        Ok(())
    }

    /// Removes a batch of keys in one pipelined submission.
    pub async fn delete_batch(&self, key_values: &[String]) -> KeyResult<usize> {
        if key_values.is_empty() {
            return Ok(0);
        }
        let ops = key_values
            .iter()
            .map(|key_value| StoreOp::Delete {
                id: record_id(key_value),
            })
            .collect();
        self.store.pipeline(ops).await?;
        info!(count = key_values.len(), "keys deleted");
        Ok(key_values.len())
    }
}
