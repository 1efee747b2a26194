//! Session registry operations.
//!
//! This module provides the session lifecycle: starting a session, completing
//! it, archiving it, and the read views over sessions.

use chrono::Utc;
use scholaris_core::SessionId;
use scholaris_store::{
    ArchivedClass, ArchivedData, ArchivedStudent, Session, SessionStatus, Store, StoreError,
};

use crate::error::{ControlError, Result};
use crate::lifecycle;
use crate::promotion::{self, active_students, PromotionEvaluator};
use crate::types::{CompletionReport, ControlConfig, CreateSessionRequest, SessionAnalytics};

/// Start a new session and make it the current one.
///
/// # Errors
///
/// Returns `ControlError::InvalidRequest` if the request is malformed, or
/// `ControlError::SessionNameTaken` if the name is already used.
pub fn create_session<S: Store + ?Sized>(
    store: &S,
    config: &ControlConfig,
    request: CreateSessionRequest,
) -> Result<Session> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ControlError::InvalidRequest(
            "session name must not be empty".into(),
        ));
    }
    if request.end_date <= request.start_date {
        return Err(ControlError::InvalidRequest(format!(
            "end date {} must be after start date {}",
            request.end_date, request.start_date
        )));
    }

    let criteria = request
        .promotion_criteria
        .unwrap_or_else(|| config.default_criteria.clone());
    if !(0.0..=100.0).contains(&criteria.minimum_attendance) {
        return Err(ControlError::InvalidRequest(format!(
            "minimum attendance must be between 0 and 100, got {}",
            criteria.minimum_attendance
        )));
    }

    let now = Utc::now();
    let session = Session {
        session_id: SessionId::generate(),
        name,
        academic_year: request.academic_year,
        start_date: request.start_date,
        end_date: request.end_date,
        description: request.description,
        status: SessionStatus::Active,
        is_current: true,
        promotion_criteria: criteria,
        archived_data: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
        archived_at: None,
    };

    insert_session(store, &session)?;

    tracing::info!(
        session_id = %session.session_id,
        name = %session.name,
        "Started session"
    );

    Ok(session)
}

/// Insert a session, reporting a name collision as `SessionNameTaken`.
pub(crate) fn insert_session<S: Store + ?Sized>(store: &S, session: &Session) -> Result<()> {
    store.create_session(session).map_err(|e| match e {
        StoreError::Conflict(_) => ControlError::SessionNameTaken(session.name.clone()),
        other => ControlError::Store(other),
    })
}

/// Get a session by ID.
///
/// # Errors
///
/// Returns `ControlError::SessionNotFound` if the session doesn't exist.
pub fn get_session<S: Store + ?Sized>(store: &S, session_id: &SessionId) -> Result<Session> {
    store
        .get_session(session_id)?
        .ok_or(ControlError::SessionNotFound(*session_id))
}

/// List all sessions, newest first.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn list_sessions<S: Store + ?Sized>(store: &S) -> Result<Vec<Session>> {
    let mut sessions = store.list_sessions()?;
    sessions.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    Ok(sessions)
}

/// Get the current session.
///
/// # Errors
///
/// Returns `ControlError::NoCurrentSession` if no session is current.
pub fn current_session<S: Store + ?Sized>(store: &S) -> Result<Session> {
    store.current_session()?.ok_or(ControlError::NoCurrentSession)
}

/// Mark a session completed, optionally promoting its eligible students.
///
/// # Errors
///
/// Returns `ControlError::SessionNotFound` if the session doesn't exist, or
/// `ControlError::InvalidTransition` if it is already completed or archived.
pub fn complete_session<S: Store + ?Sized>(
    store: &S,
    evaluator: &dyn PromotionEvaluator,
    config: &ControlConfig,
    session_id: &SessionId,
    auto_promote: bool,
) -> Result<CompletionReport> {
    let mut session = get_session(store, session_id)?;
    session.status =
        lifecycle::validate_transition(session_id, session.status, SessionStatus::Completed)?;

    let now = Utc::now();
    session.is_current = false;
    session.end_date = now.date_naive();
    session.completed_at = Some(now);
    session.updated_at = now;
    store.put_session(&session)?;

    tracing::info!(session_id = %session_id, name = %session.name, "Completed session");

    let promotion = if auto_promote {
        Some(promotion::evaluate_promotions(
            store,
            evaluator,
            config,
            session_id,
            true,
        )?)
    } else {
        None
    };

    Ok(CompletionReport { session, promotion })
}

/// Archive a completed session, snapshotting its students and classes.
///
/// # Errors
///
/// Returns `ControlError::SessionNotFound` if the session doesn't exist, or
/// `ControlError::InvalidTransition` if it is not completed.
pub fn archive_session<S: Store + ?Sized>(store: &S, session_id: &SessionId) -> Result<Session> {
    let mut session = get_session(store, session_id)?;
    session.status =
        lifecycle::validate_transition(session_id, session.status, SessionStatus::Archived)?;

    let now = Utc::now();
    let students = active_students(store, session_id)?
        .into_iter()
        .map(|s| ArchivedStudent {
            student_id: s.student_id,
            name: s.name,
            grade: s.grade,
            section: s.section,
            promotion_status: s.promotion_status,
        })
        .collect();
    let classes = store
        .list_classes_by_session(session_id)?
        .into_iter()
        .map(|c| ArchivedClass {
            class_id: c.class_id,
            name: c.name,
            section: c.section,
            current_strength: c.current_strength,
        })
        .collect();

    session.archived_data = Some(ArchivedData {
        students,
        classes,
        archived_at: now,
    });
    session.is_current = false;
    session.archived_at = Some(now);
    session.updated_at = now;
    store.put_session(&session)?;

    tracing::info!(session_id = %session_id, name = %session.name, "Archived session");

    Ok(session)
}

/// Aggregate figures for a session.
///
/// # Errors
///
/// Returns `ControlError::SessionNotFound` if the session doesn't exist.
pub fn session_analytics<S: Store + ?Sized>(
    store: &S,
    session_id: &SessionId,
) -> Result<SessionAnalytics> {
    let session = get_session(store, session_id)?;
    let students = active_students(store, session_id)?;
    let classes = store.list_classes_by_session(session_id)?;

    let mut attendance_records = 0;
    for student in &students {
        attendance_records += store.list_attendance(&student.student_id, session_id)?.len();
    }

    Ok(SessionAnalytics {
        session_id: *session_id,
        name: session.name,
        status: session.status,
        student_count: students.len(),
        class_count: classes.len(),
        active_class_count: classes.iter().filter(|c| c.is_active_session).count(),
        attendance_records,
        promotion: promotion::breakdown(&students),
    })
}
