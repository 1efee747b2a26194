//! Session lifecycle state machine.
//!
//! This module defines the valid status transitions for sessions and provides
//! validation logic to keep them one-way.
//!
//! # State Machine
//!
//! ```text
//!     ┌──────────┐  complete   ┌───────────┐  archive   ┌──────────┐
//!     │  Active  │────────────▶│ Completed │───────────▶│ Archived │
//!     └──────────┘             └───────────┘            └──────────┘
//! ```

use scholaris_core::SessionId;
use scholaris_store::SessionStatus;

use crate::error::{ControlError, Result};

/// Validates a status transition and returns the target status if valid.
///
/// # Errors
///
/// Returns `ControlError::InvalidTransition` if the transition is not allowed.
pub fn validate_transition(
    session_id: &SessionId,
    from: SessionStatus,
    to: SessionStatus,
) -> Result<SessionStatus> {
    if is_valid_transition(from, to) {
        Ok(to)
    } else {
        Err(ControlError::InvalidTransition {
            session_id: *session_id,
            from,
            to,
        })
    }
}

/// Check if a status transition is valid according to the state machine.
#[must_use]
pub const fn is_valid_transition(from: SessionStatus, to: SessionStatus) -> bool {
    use SessionStatus::{Active, Archived, Completed};

    matches!((from, to), (Active, Completed) | (Completed, Archived))
}

/// Returns true if the session can no longer change.
#[must_use]
pub const fn is_terminal(status: SessionStatus) -> bool {
    matches!(status, SessionStatus::Archived)
}

/// Returns true if the session can be rolled over into a new one.
#[must_use]
pub const fn can_roll_over(status: SessionStatus) -> bool {
    !is_terminal(status)
}
