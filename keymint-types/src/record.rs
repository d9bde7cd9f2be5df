//! The persisted key record and its type/status enums.
//!
//! A record is stored as a flat hash of JSON values under a namespaced id,
//! matching the store's hash-record model. `RecordFields` is that wire
//! shape; `KeyRecord` is the typed view the engine works with.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The wire shape of a stored record: field name to JSON value.
pub type RecordFields = serde_json::Map<String, Value>;

/// The kind of license key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// One-time purchase, never expires.
    Permanent,
    /// Time-bounded key subject to expiry and one-per-identity issuance.
    Trial,
}

impl KeyType {
    /// Returns true for trial keys.
    #[must_use]
    pub fn is_trial(&self) -> bool {
        matches!(self, Self::Trial)
    }

    /// The lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Trial => "trial",
        }
    }
}

/// Whether a key has been consumed in its current activation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    /// Issued but not yet activated.
    Unused,
    /// Activated; stays used until an explicit reset.
    Used,
}

impl ValidationStatus {
    /// The lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Used => "used",
        }
    }
}

/// One issued license key and its lifecycle state.
///
/// `key_value`, `key_type`, `created_at`, and `expires_at` are immutable
/// after issuance. `activated_at` and `web_validated_time` are set together
/// at first activation. `user_id` is set at most once per activation cycle,
/// during the first identity-bound activation of a trial key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// The key string itself, globally unique.
    pub key_value: String,
    /// Permanent or trial.
    pub key_type: KeyType,
    /// Unused until activated; reset returns it to unused.
    pub validation_status: ValidationStatus,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
    /// Expiry wall-clock time; present only for trial keys.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// First activation time in the current cycle.
    #[serde(default)]
    pub activated_at: Option<DateTime<Utc>>,
    /// Web validation time; set together with `activated_at`.
    #[serde(default)]
    pub web_validated_time: Option<DateTime<Utc>>,
    /// Identity token bound at first identity-bound activation.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl KeyRecord {
    /// Creates a fresh, unused record.
    #[must_use]
    pub fn new(
        key_value: String,
        key_type: KeyType,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            key_value,
            key_type,
            validation_status: ValidationStatus::Unused,
            created_at,
            expires_at,
            activated_at: None,
            web_validated_time: None,
            user_id: None,
        }
    }

    /// Returns true if this is a trial key whose expiry has passed.
    ///
    /// Evaluated against wall-clock time on every access that grants use,
    /// independent of `validation_status`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.key_type.is_trial() && self.expires_at.is_some_and(|exp| now > exp)
    }

    /// Converts to the stored hash-record shape.
    pub fn to_fields(&self) -> Result<RecordFields> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::MalformedRecord(format!(
                "record serialized to non-object: {other}"
            ))),
        }
    }

    /// Parses a stored hash-record back into a typed record.
    pub fn from_fields(fields: &RecordFields) -> Result<Self> {
        serde_json::from_value(Value::Object(fields.clone())).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn permanent_key_never_expires() {
        let now = Utc::now();
        let record = KeyRecord::new("MSKabc123".into(), KeyType::Permanent, now, None);
        assert!(!record.is_expired(now + Duration::days(10_000)));
    }

    #[test]
    fn trial_key_expiry_is_strict() {
        let now = Utc::now();
        let record =
            KeyRecord::new("MSKabc123sy".into(), KeyType::Trial, now, Some(now));
        assert!(!record.is_expired(now));
        assert!(record.is_expired(now + Duration::seconds(1)));
    }

    #[test]
    fn trial_key_without_expiry_does_not_expire() {
        let now = Utc::now();
        let record = KeyRecord::new("MSKabc123sy".into(), KeyType::Trial, now, None);
        assert!(!record.is_expired(now + Duration::days(1)));
    }
}
