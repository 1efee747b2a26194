//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use scholaris_control::AcademicControl;

use crate::handlers::{attendance, health, promotion, sessions};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Health
/// - `GET /health` - Health check
///
/// ## Sessions
/// - `POST /sessions/start` - Start a session and make it current
/// - `GET /sessions` - List sessions
/// - `GET /sessions/current` - Get the current session
/// - `GET /sessions/:session_id` - Get session
/// - `PUT /sessions/:session_id/complete` - Complete session
/// - `PUT /sessions/:session_id/archive` - Archive session
/// - `GET /sessions/:session_id/analytics` - Session analytics
///
/// ## Rollover
/// - `POST /sessions/:session_id/auto-rollover` - Roll over into the next session
/// - `GET /sessions/:session_id/rollover-runs` - List rollover runs
/// - `POST /rollover-runs/:run_id/resume` - Resume a failed run
///
/// ## Promotion
/// - `POST /promotion/evaluate/:session_id` - Evaluate a completed session
/// - `POST /promotion/promote/:student_id` - Promote one student
/// - `POST /promotion/bulk-promote` - Promote many students
/// - `GET /promotion/status/:session_id` - Promotion progress
///
/// ## Attendance
/// - `POST /attendance/bulk-mark` - Mark one day for many students
/// - `GET /attendance/:student_id/:session_id` - Attendance summary
pub fn create_router<C>(state: GatewayState<C>) -> Router
where
    C: AcademicControl + 'static,
{
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health::<C>))
        // Sessions
        .route("/sessions", get(sessions::list_sessions::<C>))
        .route("/sessions/start", post(sessions::start_session::<C>))
        .route("/sessions/current", get(sessions::current_session::<C>))
        .route("/sessions/:session_id", get(sessions::get_session::<C>))
        .route(
            "/sessions/:session_id/complete",
            put(sessions::complete_session::<C>),
        )
        .route(
            "/sessions/:session_id/archive",
            put(sessions::archive_session::<C>),
        )
        .route(
            "/sessions/:session_id/analytics",
            get(sessions::session_analytics::<C>),
        )
        // Rollover
        .route(
            "/sessions/:session_id/auto-rollover",
            post(sessions::auto_rollover::<C>),
        )
        .route(
            "/sessions/:session_id/rollover-runs",
            get(sessions::list_rollover_runs::<C>),
        )
        .route(
            "/rollover-runs/:run_id/resume",
            post(sessions::resume_rollover::<C>),
        )
        // Promotion
        .route(
            "/promotion/evaluate/:session_id",
            post(promotion::evaluate::<C>),
        )
        .route(
            "/promotion/promote/:student_id",
            post(promotion::promote::<C>),
        )
        .route(
            "/promotion/bulk-promote",
            post(promotion::bulk_promote::<C>),
        )
        .route(
            "/promotion/status/:session_id",
            get(promotion::status::<C>),
        )
        // Attendance
        .route("/attendance/bulk-mark", post(attendance::bulk_mark::<C>))
        .route(
            "/attendance/:student_id/:session_id",
            get(attendance::summary::<C>),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
