//! Health classification for the non-mutating status check.

use crate::{KeyRecord, KeyType, ValidationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a periodic client-side health check learns about a key.
///
/// Reported without altering `validation_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// A permanent key; no expiry to watch.
    Permanent,
    /// An activated trial key whose expiry has not passed.
    TrialActive,
    /// A trial key whose expiry has passed.
    TrialExpired,
    /// No record exists for the presented key.
    NotFound,
    /// The record exists but is not in a checkable state
    /// (a trial key that was never activated).
    Invalid,
}

impl KeyStatus {
    /// Classifies an existing record at the given instant.
    #[must_use]
    pub fn of_record(record: &KeyRecord, now: DateTime<Utc>) -> Self {
        match record.key_type {
            KeyType::Permanent => Self::Permanent,
            KeyType::Trial => {
                if record.is_expired(now) {
                    Self::TrialExpired
                } else if record.validation_status == ValidationStatus::Used {
                    Self::TrialActive
                } else {
                    Self::Invalid
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn trial(now: DateTime<Utc>, expires_in: Duration) -> KeyRecord {
        KeyRecord::new(
            "MSKtestaasy".into(),
            KeyType::Trial,
            now,
            Some(now + expires_in),
        )
    }

    #[test]
    fn permanent_is_permanent_regardless_of_status() {
        let now = Utc::now();
        let mut record = KeyRecord::new("MSKtestaa".into(), KeyType::Permanent, now, None);
        assert_eq!(KeyStatus::of_record(&record, now), KeyStatus::Permanent);
        record.validation_status = ValidationStatus::Used;
        assert_eq!(KeyStatus::of_record(&record, now), KeyStatus::Permanent);
    }

    #[test]
    fn used_current_trial_is_active() {
        let now = Utc::now();
        let mut record = trial(now, Duration::days(7));
        record.validation_status = ValidationStatus::Used;
        assert_eq!(KeyStatus::of_record(&record, now), KeyStatus::TrialActive);
    }

    #[test]
    fn expiry_wins_over_used_status() {
        let now = Utc::now();
        let mut record = trial(now, Duration::days(7));
        record.validation_status = ValidationStatus::Used;
        let later = now + Duration::days(8);
        assert_eq!(KeyStatus::of_record(&record, later), KeyStatus::TrialExpired);
    }

    #[test]
    fn unused_trial_is_invalid_for_health_checks() {
        let now = Utc::now();
        let record = trial(now, Duration::days(7));
        assert_eq!(KeyStatus::of_record(&record, now), KeyStatus::Invalid);
    }
}
