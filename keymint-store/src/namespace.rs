//! Namespaced id construction for the flat store.
//!
//! Every persisted entity lives under a fixed prefix so that unrelated
//! records never collide and prefix scans stay cheap.

/// Prefix for key records.
pub const RECORD_PREFIX: &str = "key:";

/// Prefix for one-trial-per-identity marker flags.
pub const TRIAL_MARKER_PREFIX: &str = "trial_user:";

/// Singleton hash-record holding operator-configured links.
pub const SYSTEM_CONFIG_ID: &str = "system_config";

/// Store id for the record of a given key value.
#[must_use]
pub fn record_id(key_value: &str) -> String {
    format!("{RECORD_PREFIX}{key_value}")
}

/// Store id for the trial marker of a given identity token.
#[must_use]
pub fn trial_marker_id(identity_token: &str) -> String {
    format!("{TRIAL_MARKER_PREFIX}{identity_token}")
}
