//! Error types for the control layer.
//!
//! This module defines all errors that can occur during session lifecycle,
//! promotion and rollover operations.

use scholaris_core::{RunId, SessionId, StudentId};
use scholaris_store::{SessionStatus, StoreError};
use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur in control operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The requested session was not found.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// No session is marked current.
    #[error("no current session")]
    NoCurrentSession,

    /// The requested student was not found.
    #[error("student not found: {0}")]
    StudentNotFound(StudentId),

    /// The requested rollover run was not found.
    #[error("rollover run not found: {0}")]
    RunNotFound(RunId),

    /// The requested session status transition is not valid.
    #[error("invalid status transition for session {session_id}: cannot go from {from:?} to {to:?}")]
    InvalidTransition {
        /// The session being transitioned.
        session_id: SessionId,
        /// The current status.
        from: SessionStatus,
        /// The requested status.
        to: SessionStatus,
    },

    /// The operation is not allowed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The student does not meet the promotion criteria.
    #[error("student {student_id} is not eligible for promotion: {reason}")]
    NotEligible {
        /// The student evaluated.
        student_id: StudentId,
        /// Why the student is ineligible.
        reason: String,
    },

    /// The request is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Another session already uses this name.
    #[error("session name already exists: {0}")]
    SessionNameTaken(String),

    /// A rollover is already running for this source session.
    #[error("a rollover is already in progress for session {0}")]
    RolloverInProgress(SessionId),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::SessionNotFound(_)
            | Self::NoCurrentSession
            | Self::StudentNotFound(_)
            | Self::RunNotFound(_)
            | Self::Store(StoreError::NotFound) => 404,
            Self::InvalidTransition { .. }
            | Self::InvalidState(_)
            | Self::NotEligible { .. }
            | Self::InvalidRequest(_) => 400,
            Self::SessionNameTaken(_)
            | Self::RolloverInProgress(_)
            | Self::Store(StoreError::Conflict(_)) => 409,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Database(_)) | Self::Internal(_)
        )
    }
}
