//! Expiry and one-trial-per-identity enforcement.

use crate::error::{KeyError, KeyResult};
use chrono::{DateTime, Utc};
use keymint_store::{trial_marker_id, KeyStore};
use keymint_types::{KeyRecord, ValidationStatus};
use std::sync::Arc;

/// What the guard allows for a given record and identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proceed with the unused→used transition, binding the presented
    /// identity when `bind_identity` is set.
    Activate { bind_identity: bool },
    /// The record is already active for this caller; succeed without
    /// writing anything.
    AlreadyActive,
}

/// Decides whether use may proceed and whether an identity binding must
/// occur. Refusals come back as [`KeyError`] variants.
pub struct TrialGuard {
    store: Arc<dyn KeyStore>,
}

impl TrialGuard {
    #[must_use]
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Evaluates the decision procedure against current wall-clock time,
    /// consulting the identity marker only on the one path that needs it.
    pub async fn evaluate(
        &self,
        record: &KeyRecord,
        identity_token: Option<&str>,
    ) -> KeyResult<Decision> {
        let now = Utc::now();
        let identity_has_trialed = match identity_token {
            Some(token)
                if record.key_type.is_trial()
                    && record.validation_status == ValidationStatus::Unused
                    && !record.is_expired(now) =>
            {
                self.store.flag_exists(&trial_marker_id(token)).await?
            }
            _ => false,
        };
        decide(record, identity_token, now, identity_has_trialed)
    }
}

/// The decision procedure itself, deterministic in its inputs.
///
/// Evaluated in this order, which fixes the error code for every state:
/// 1. A past expiry refuses the key outright, whatever its status.
/// 2. A used permanent key re-validates idempotently; a used trial key
///    succeeds only for the identity it is bound to.
/// 3. An unused trial key under an identity-bound flow is refused when the
///    identity already consumed a trial, else activates with binding.
/// 4. Anything else unused activates without binding.
pub fn decide(
    record: &KeyRecord,
    identity_token: Option<&str>,
    now: DateTime<Utc>,
    identity_has_trialed: bool,
) -> KeyResult<Decision> {
    if record.is_expired(now) {
        return Err(KeyError::TrialExpired);
    }

    if record.validation_status == ValidationStatus::Used {
        if !record.key_type.is_trial() {
            return Ok(Decision::AlreadyActive);
        }
        let Some(token) = identity_token else {
            return Err(KeyError::AlreadyUsed);
        };
        return match record.user_id.as_deref() {
            // Consumed by the web-only flow; a bound flow cannot adopt it.
            None => Err(KeyError::AlreadyUsed),
            Some(bound) if bound == token => Ok(Decision::AlreadyActive),
            Some(_) => Err(KeyError::IdentityMismatch),
        };
    }

    if record.key_type.is_trial() && identity_token.is_some() {
        if identity_has_trialed {
            return Err(KeyError::TrialAlreadyConsumed);
        }
        return Ok(Decision::Activate {
            bind_identity: true,
        });
    }

    Ok(Decision::Activate {
        bind_identity: false,
    })
}
