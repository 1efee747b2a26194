//! Promotion endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use scholaris_control::{AcademicControl, BulkPromoteRequest, PromoteRequest};
use scholaris_core::{SessionId, StudentId};

use super::parse_id;
use crate::error::ApiError;
use crate::state::GatewayState;

/// Body of an evaluate request.
#[derive(Debug, Default, Deserialize)]
pub struct EvaluateBody {
    /// Apply the promotion to eligible students.
    #[serde(default)]
    pub auto_promote: bool,
}

/// Evaluate every student of a completed session.
///
/// # Errors
///
/// Returns an error if the session is not found or not completed.
pub async fn evaluate<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(session_id): Path<String>,
    body: Option<Json<EvaluateBody>>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;
    let Json(body) = body.unwrap_or_default();

    let report = state
        .control
        .evaluate_promotions(&session_id, body.auto_promote)
        .await?;
    Ok(Json(report))
}

/// Promote one eligible student.
///
/// # Errors
///
/// Returns an error if the student is not found or not eligible.
pub async fn promote<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(student_id): Path<String>,
    body: Option<Json<PromoteRequest>>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let student_id: StudentId = parse_id("student", &student_id)?;
    let Json(request) = body.unwrap_or_default();

    Ok(Json(state.control.promote_student(&student_id, request).await?))
}

/// Promote an explicit list of students. Per-student failures are reported
/// in the body with a 200 status.
///
/// # Errors
///
/// Returns an error if the session is not found.
pub async fn bulk_promote<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Json(request): Json<BulkPromoteRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    Ok(Json(state.control.bulk_promote(request).await?))
}

/// Promotion progress of a session.
///
/// # Errors
///
/// Returns an error if the session is not found.
pub async fn status<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;
    Ok(Json(state.control.promotion_status(&session_id).await?))
}
