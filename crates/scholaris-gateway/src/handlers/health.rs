//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use scholaris_control::AcademicControl;

use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when the store answers, `degraded` otherwise.
    pub status: &'static str,
    /// Store reachability, `ok` or `unavailable`.
    pub store: &'static str,
    /// Service version.
    pub version: &'static str,
}

impl HealthResponse {
    fn new(store_ok: bool) -> (StatusCode, Self) {
        let (code, status, store) = if store_ok {
            (StatusCode::OK, "healthy", "ok")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        };
        (
            code,
            Self {
                status,
                store,
                version: env!("CARGO_PKG_VERSION"),
            },
        )
    }
}

/// Health check handler. Answers 503 when the store cannot be read.
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// { "status": "healthy", "store": "ok", "version": "0.1.0" }
/// ```
pub async fn health<C>(State(state): State<Arc<GatewayState<C>>>) -> impl IntoResponse
where
    C: AcademicControl + 'static,
{
    let store_ok = match state.control.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            false
        }
    };

    let (code, response) = HealthResponse::new(store_ok);
    (code, Json(response))
}
