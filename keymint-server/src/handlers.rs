//! Client-facing activation and status handlers.

use crate::{ApiError, ApiResponse, AppState};
use axum::extract::State;
use axum::response::Json;
use chrono::{DateTime, Utc};
use keymint_types::{KeyStatus, KeyType, ValidationStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub key: String,
    /// Opaque identity token; present on the identity-bound flow.
    #[serde(default)]
    pub identity_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivateData {
    pub key_value: String,
    pub key_type: KeyType,
    pub validation_status: ValidationStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub shortcut_link: Option<String>,
}

/// POST /api/v1/keys/activate
pub async fn activate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ActivateRequest>,
) -> Result<Json<ApiResponse<ActivateData>>, ApiError> {
    let result = state
        .coordinator
        .activate(&request.key, request.identity_token.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(
        "key activated",
        ActivateData {
            key_value: result.key_value,
            key_type: result.key_type,
            validation_status: result.validation_status,
            expires_at: result.expires_at,
            shortcut_link: result.shortcut_link,
        },
    )))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct StatusData {
    pub status: KeyStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub shortcut_link: Option<String>,
}

/// POST /api/v1/keys/status. The periodic client-side health check;
/// never mutates the record.
pub async fn check_status(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<ApiResponse<StatusData>>, ApiError> {
    let report = state.coordinator.check_status(&request.key).await?;
    let message = match report.status {
        KeyStatus::Permanent | KeyStatus::TrialActive => "key is valid",
        KeyStatus::TrialExpired => "trial key has expired",
        KeyStatus::NotFound => "key does not exist",
        KeyStatus::Invalid => "key is not in a checkable state",
    };
    Ok(Json(ApiResponse::ok(
        message,
        StatusData {
            status: report.status,
            expires_at: report.expires_at,
            shortcut_link: report.shortcut_link,
        },
    )))
}
