//! Attendance endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use scholaris_control::{AcademicControl, MarkAttendanceRequest};
use scholaris_core::{SessionId, StudentId};

use super::parse_id;
use crate::error::ApiError;
use crate::state::GatewayState;

/// Mark one day of attendance for many students.
///
/// # Errors
///
/// Returns an error if the session is not found.
pub async fn bulk_mark<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Json(request): Json<MarkAttendanceRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    Ok(Json(state.control.mark_attendance(request).await?))
}

/// A student's attendance in a session.
///
/// # Errors
///
/// Returns an error if the student or session is not found.
pub async fn summary<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path((student_id, session_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let student_id: StudentId = parse_id("student", &student_id)?;
    let session_id: SessionId = parse_id("session", &session_id)?;

    Ok(Json(
        state
            .control
            .attendance_summary(&student_id, &session_id)
            .await?,
    ))
}
