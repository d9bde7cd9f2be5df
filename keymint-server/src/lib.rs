//! HTTP API for the Keymint license key service.
//!
//! Thin collaborator layer over `keymint-core`: axum handlers parse the
//! JSON envelopes, check the administrator password where required, and
//! translate engine refusals into status codes. All business invariants
//! live in the engine.

mod admin;
mod error;
mod handlers;

use axum::routing::{get, post};
use axum::Router;
use keymint_core::{ActivationCoordinator, KeyLifecycle};
use keymint_store::KeyStore;
use serde::Serialize;
use std::sync::Arc;

pub use error::ApiError;

/// Shared state behind every handler.
pub struct AppState {
    pub store: Arc<dyn KeyStore>,
    pub lifecycle: KeyLifecycle,
    pub coordinator: ActivationCoordinator,
    admin_password: String,
}

impl AppState {
    /// Wires the engine components to one store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyStore>, admin_password: String) -> Arc<Self> {
        Arc::new(Self {
            lifecycle: KeyLifecycle::new(store.clone()),
            coordinator: ActivationCoordinator::new(store.clone()),
            store,
            admin_password,
        })
    }

    /// Compares a presented administrator password.
    pub(crate) fn authorize(&self, password: &str) -> Result<(), ApiError> {
        if password == self.admin_password {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

/// The uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A success envelope carrying data.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A success envelope with no data.
    #[must_use]
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    /// A failure envelope; used by the error mapping.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Builds the HTTP API router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/keys/activate", post(handlers::activate))
        .route("/api/v1/keys/status", post(handlers::check_status))
        .route("/api/v1/admin/verify", post(admin::verify))
        .route("/api/v1/admin/stats", get(admin::stats))
        .route("/api/v1/admin/keys", get(admin::list_keys))
        .route("/api/v1/admin/keys/batch", post(admin::batch_issue))
        .route("/api/v1/admin/keys/reset", post(admin::reset_key))
        .route("/api/v1/admin/keys/delete", post(admin::delete_keys))
        .route(
            "/api/v1/admin/config",
            get(admin::get_config).post(admin::set_config),
        )
        .with_state(state)
}
