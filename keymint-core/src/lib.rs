//! License key lifecycle engine for Keymint.
//!
//! This crate owns the state machine with real invariants:
//! - Collision-checked key generation (`generator`)
//! - Issue / reset / delete (`KeyLifecycle`)
//! - Expiry and one-trial-per-identity enforcement (`TrialGuard`)
//! - The activation transition itself (`ActivationCoordinator`)
//!
//! # Consistency model
//!
//! Request handlers share no process memory; every request re-reads
//! current state from the store. The unused→used transition is written
//! with a conditional compare-and-swap on `validation_status`, batched in
//! one pipeline with the identity marker write, so two concurrent
//! activations of the same key can never both win: the loser's guard
//! fails, its marker op is never applied, and re-evaluation of the fresh
//! record yields the correct refusal (or the idempotent success for a
//! permanent key).

mod activation;
mod error;
mod generator;
mod guard;
mod lifecycle;

pub use activation::{ActivationCoordinator, ActivationResult, StatusReport, TRIAL_MARKER_TTL};
pub use error::{KeyError, KeyResult};
pub use generator::{
    generate, generate_unique, KEY_PREFIX, MAX_COLLISION_ATTEMPTS, RANDOM_LEN, TRIAL_SUFFIX,
};
pub use guard::{decide, Decision, TrialGuard};
pub use lifecycle::{ExpiryPolicy, KeyLifecycle};
