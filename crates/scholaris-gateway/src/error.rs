//! API error types and responses.
//!
//! This module defines the standard error format for all API responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use scholaris_control::ControlError;
use scholaris_store::StoreError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invalid request body, parameters or state.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::SessionNotFound(id) => Self::NotFound(format!("session {id}")),
            ControlError::NoCurrentSession => Self::NotFound("current session".to_string()),
            ControlError::StudentNotFound(id) => Self::NotFound(format!("student {id}")),
            ControlError::RunNotFound(id) => Self::NotFound(format!("rollover run {id}")),
            ControlError::InvalidTransition { from, to, .. } => {
                Self::BadRequest(format!("cannot move session from {from:?} to {to:?}"))
            }
            ControlError::NotEligible { reason, .. } => {
                Self::BadRequest(format!("student is not eligible for promotion: {reason}"))
            }
            ControlError::InvalidState(msg) | ControlError::InvalidRequest(msg) => {
                Self::BadRequest(msg)
            }
            ControlError::SessionNameTaken(name) => {
                Self::Conflict(format!("session {name} already exists"))
            }
            ControlError::RolloverInProgress(id) => {
                Self::Conflict(format!("a rollover is already in progress for session {id}"))
            }
            ControlError::Store(StoreError::NotFound) => Self::NotFound("record".to_string()),
            ControlError::Store(StoreError::Conflict(msg)) => Self::Conflict(msg),
            ControlError::Store(store_err) => {
                tracing::error!(error = %store_err, "Store error");
                Self::Internal("storage error".to_string())
            }
            ControlError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Self::Internal(msg)
            }
        }
    }
}
