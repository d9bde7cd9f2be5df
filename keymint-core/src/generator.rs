//! Collision-checked random key identifiers.
//!
//! Keys are short human-typed codes, not secrets: a fixed prefix, six
//! characters drawn uniformly from the 62-symbol alphanumeric alphabet,
//! and a fixed suffix marking trial keys so they stay lexically
//! recognizable.

use crate::error::KeyResult;
use keymint_store::{record_id, KeyStore};
use keymint_types::KeyType;
use rand::Rng;

/// Fixed prefix of every issued key.
pub const KEY_PREFIX: &str = "MSK";

/// Suffix appended to trial keys.
pub const TRIAL_SUFFIX: &str = "sy";

/// Number of random characters between prefix and suffix.
pub const RANDOM_LEN: usize = 6;

/// Collision retries before a generation unit is abandoned.
pub const MAX_COLLISION_ATTEMPTS: usize = 5;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Draws one key identifier of the given type.
#[must_use]
pub fn generate(key_type: KeyType) -> String {
    let mut rng = rand::thread_rng();
    let mut key =
        String::with_capacity(KEY_PREFIX.len() + RANDOM_LEN + TRIAL_SUFFIX.len());
    key.push_str(KEY_PREFIX);
    for _ in 0..RANDOM_LEN {
        key.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
    }
    if key_type.is_trial() {
        key.push_str(TRIAL_SUFFIX);
    }
    key
}

/// Draws identifiers until one does not collide with an existing record.
///
/// Returns `None` after [`MAX_COLLISION_ATTEMPTS`] collisions; bulk
/// issuance treats that as an acceptable under-delivery, not an error.
pub async fn generate_unique(
    store: &dyn KeyStore,
    key_type: KeyType,
) -> KeyResult<Option<String>> {
    for _ in 0..MAX_COLLISION_ATTEMPTS {
        let candidate = generate(key_type);
        if !store.exists(&record_id(&candidate)).await? {
            return Ok(Some(candidate));
        }
    }
    tracing::warn!(
        key_type = key_type.as_str(),
        attempts = MAX_COLLISION_ATTEMPTS,
        "key generation abandoned after repeated collisions"
    );
    Ok(None)
}
