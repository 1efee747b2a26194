//! Session and rollover endpoints.
//!
//! This module provides handlers for the session lifecycle, analytics and the
//! rollover saga.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use scholaris_control::{AcademicControl, CreateSessionRequest, RolloverRun, Session};
use scholaris_core::{RunId, SessionId};

use super::parse_id;
use crate::error::ApiError;
use crate::state::GatewayState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of a complete request.
#[derive(Debug, Default, Deserialize)]
pub struct CompleteSessionBody {
    /// Promote eligible students as part of completion.
    #[serde(default)]
    pub auto_promote: bool,
}

/// Response for listing sessions.
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    /// Sessions, newest first.
    pub sessions: Vec<Session>,
}

/// Response for listing rollover runs.
#[derive(Debug, Serialize)]
pub struct ListRunsResponse {
    /// Runs, newest first.
    pub runs: Vec<RolloverRun>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Start a new session and make it current.
///
/// # Errors
///
/// Returns an error if the request is invalid or the name is taken.
pub async fn start_session<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let session = state.control.start_session(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// List all sessions.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn list_sessions<C>(
    State(state): State<Arc<GatewayState<C>>>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let sessions = state.control.list_sessions().await?;
    Ok(Json(ListSessionsResponse { sessions }))
}

/// Get the current session.
///
/// # Errors
///
/// Returns not found if no session is current.
pub async fn current_session<C>(
    State(state): State<Arc<GatewayState<C>>>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    Ok(Json(state.control.current_session().await?))
}

/// Get a session by ID.
///
/// # Errors
///
/// Returns an error if the session is not found.
pub async fn get_session<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;
    Ok(Json(state.control.get_session(&session_id).await?))
}

/// Complete a session. The body is optional.
///
/// # Errors
///
/// Returns an error if the session is not found or not active.
pub async fn complete_session<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(session_id): Path<String>,
    body: Option<Json<CompleteSessionBody>>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;
    let Json(body) = body.unwrap_or_default();

    let report = state
        .control
        .complete_session(&session_id, body.auto_promote)
        .await?;
    Ok(Json(report))
}

/// Archive a completed session.
///
/// # Errors
///
/// Returns an error if the session is not found or not completed.
pub async fn archive_session<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;
    Ok(Json(state.control.archive_session(&session_id).await?))
}

/// Aggregate figures for a session.
///
/// # Errors
///
/// Returns an error if the session is not found.
pub async fn session_analytics<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;
    Ok(Json(state.control.session_analytics(&session_id).await?))
}

/// Roll a session over into the next one.
///
/// # Errors
///
/// Returns conflict if a rollover of this session is already running.
pub async fn auto_rollover<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;
    Ok(Json(state.control.auto_rollover(&session_id).await?))
}

/// List the rollover runs of a source session.
///
/// # Errors
///
/// Returns an error if the session is not found.
pub async fn list_rollover_runs<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let session_id: SessionId = parse_id("session", &session_id)?;
    let runs = state.control.list_rollover_runs(&session_id).await?;
    Ok(Json(ListRunsResponse { runs }))
}

/// Resume a failed or interrupted rollover run.
///
/// # Errors
///
/// Returns an error if the run is not found, already completed, or running.
pub async fn resume_rollover<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(run_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: AcademicControl + 'static,
{
    let run_id: RunId = parse_id("run", &run_id)?;
    Ok(Json(state.control.resume_rollover(&run_id).await?))
}
