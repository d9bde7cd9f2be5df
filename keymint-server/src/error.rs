//! Translation of engine refusals into HTTP responses.

use crate::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use keymint_core::KeyError;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Administrator password missing or wrong.
    #[error("unauthorized")]
    Unauthorized,

    /// The request body is structurally valid JSON but semantically bad.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A refusal or failure from the lifecycle engine.
    #[error(transparent)]
    Key(#[from] KeyError),
}

impl From<keymint_store::StoreError> for ApiError {
    fn from(err: keymint_store::StoreError) -> Self {
        Self::Key(KeyError::from(err))
    }
}

impl From<keymint_types::Error> for ApiError {
    fn from(err: keymint_types::Error) -> Self {
        Self::Key(KeyError::from(err))
    }
}

impl ApiError {
    /// The HTTP status for this error.
    ///
    /// Business refusals keep their distinct codes; only store and record
    /// failures collapse into a generic 500.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Key(err) => match err {
                KeyError::InvalidInput | KeyError::InvalidDuration => StatusCode::BAD_REQUEST,
                KeyError::KeyNotFound => StatusCode::NOT_FOUND,
                KeyError::TrialExpired
                | KeyError::IdentityMismatch
                | KeyError::TrialAlreadyConsumed => StatusCode::FORBIDDEN,
                KeyError::AlreadyUsed => StatusCode::CONFLICT,
                KeyError::Record(_) | KeyError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Internal failures are logged in full and reported generically.
            ApiError::Key(err @ (KeyError::Record(_) | KeyError::Store(_))) => {
                error!(error = %err, "internal failure");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ApiResponse::failure(message))).into_response()
    }
}
