//! Administrator handlers: issuance, dashboard reads, reset/delete, and
//! the operator config links.
//!
//! Authentication is a shared-password comparison; the password travels in
//! the request body for mutations and the query string for dashboard
//! reads, matching what the dashboard client sends.

use crate::{ApiError, ApiResponse, AppState};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use keymint_core::ExpiryPolicy;
use keymint_store::{RECORD_PREFIX, SYSTEM_CONFIG_ID};
use keymint_types::{KeyRecord, KeyType, SystemConfig, ValidationStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub password: String,
}

/// POST /api/v1/admin/verify. Dashboard login check.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.authorize(&request.password)?;
    Ok(Json(ApiResponse::ok_empty("authorized")))
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub total_keys: usize,
    pub used_keys: usize,
}

/// GET /api/v1/admin/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ApiResponse<StatsData>>, ApiError> {
    state.authorize(&query.password)?;
    let records = load_all_records(&state).await?;
    let used_keys = records
        .iter()
        .filter(|record| record.validation_status == ValidationStatus::Used)
        .count();
    Ok(Json(ApiResponse::ok(
        "stats",
        StatsData {
            total_keys: records.len(),
            used_keys,
        },
    )))
}

/// GET /api/v1/admin/keys. Full record list for the dashboard table.
pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ApiResponse<Vec<KeyRecord>>>, ApiError> {
    state.authorize(&query.password)?;
    let mut records = load_all_records(&state).await?;
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(ApiResponse::ok("keys", records)))
}

fn default_quantity() -> usize {
    1
}

fn default_key_type() -> KeyType {
    KeyType::Permanent
}

#[derive(Debug, Deserialize)]
pub struct BatchIssueRequest {
    #[serde(default = "default_quantity")]
    pub quantity: usize,
    #[serde(default = "default_key_type")]
    pub key_type: KeyType,
    #[serde(default)]
    pub duration_days: Option<i64>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct BatchIssueData {
    pub generated_keys: Vec<String>,
    pub added_count: usize,
}

/// POST /api/v1/admin/keys/batch
pub async fn batch_issue(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchIssueRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BatchIssueData>>), ApiError> {
    state.authorize(&request.password)?;
    let policy = ExpiryPolicy {
        duration_days: request.duration_days,
        duration_minutes: request.duration_minutes,
    };
    let issued = state
        .lifecycle
        .issue_batch(request.quantity, request.key_type, policy)
        .await?;
    let generated_keys: Vec<String> = issued.into_iter().map(|r| r.key_value).collect();
    let added_count = generated_keys.len();
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            format!("generated {added_count} keys"),
            BatchIssueData {
                generated_keys,
                added_count,
            },
        )),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub key_value: String,
    pub password: String,
}

/// POST /api/v1/admin/keys/reset
pub async fn reset_key(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.authorize(&request.password)?;
    state.lifecycle.reset(&request.key_value).await?;
    Ok(Json(ApiResponse::ok_empty(format!(
        "key {} reset to unused",
        request.key_value
    ))))
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub key_values: Vec<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteData {
    pub deleted_count: usize,
}

/// POST /api/v1/admin/keys/delete
pub async fn delete_keys(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<ApiResponse<DeleteData>>, ApiError> {
    state.authorize(&request.password)?;
    let deleted_count = state.lifecycle.delete_batch(&request.key_values).await?;
    Ok(Json(ApiResponse::ok(
        "keys deleted",
        DeleteData { deleted_count },
    )))
}

/// GET /api/v1/admin/config
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ApiResponse<SystemConfig>>, ApiError> {
    state.authorize(&query.password)?;
    let config = read_config(&state).await?;
    Ok(Json(ApiResponse::ok("config", config)))
}

#[derive(Debug, Deserialize)]
pub struct SetConfigRequest {
    pub link_type: String,
    pub url: String,
    pub password: String,
}

/// POST /api/v1/admin/config. Updates one link slot.
pub async fn set_config(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetConfigRequest>,
) -> Result<Json<ApiResponse<SystemConfig>>, ApiError> {
    state.authorize(&request.password)?;
    let mut config = read_config(&state).await?;
    match request.link_type.as_str() {
        "shortcut" => config.shortcut_link = Some(request.url),
        "doc" => config.doc_link = Some(request.url),
        other => {
            return Err(ApiError::InvalidRequest(format!(
                "unknown link type: {other}"
            )))
        }
    }
    state
        .store
        .write_record(SYSTEM_CONFIG_ID, config.to_fields()?)
        .await?;
    Ok(Json(ApiResponse::ok("config saved", config)))
}

async fn read_config(state: &AppState) -> Result<SystemConfig, ApiError> {
    match state.store.read_record(SYSTEM_CONFIG_ID).await? {
        Some(fields) => Ok(SystemConfig::from_fields(&fields)?),
        None => Ok(SystemConfig::default()),
    }
}

async fn load_all_records(state: &AppState) -> Result<Vec<KeyRecord>, ApiError> {
    let ids = state.store.list_ids(RECORD_PREFIX).await?;
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(fields) = state.store.read_record(&id).await? {
            records.push(KeyRecord::from_fields(&fields)?);
        }
    }
    Ok(records)
}
