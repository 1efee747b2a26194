//! Request and response types for control operations.
//!
//! These types define the API contracts for session, promotion and attendance
//! management.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use scholaris_core::{SessionId, StudentId};
use scholaris_store::{AttendanceStatus, PromotionCriteria, Session, SessionStatus};
use serde::{Deserialize, Serialize};

use crate::promotion::Verdict;

// =============================================================================
// Sessions
// =============================================================================

/// Request to start a new academic session.
///
/// The new session becomes the current one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Unique session name, e.g. `2025-2026`.
    pub name: String,
    /// Academic year label.
    pub academic_year: String,
    /// First day of the session.
    pub start_date: NaiveDate,
    /// Last day of the session.
    pub end_date: NaiveDate,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Promotion criteria. Uses the configured defaults if not provided.
    #[serde(default)]
    pub promotion_criteria: Option<PromotionCriteria>,
}

impl CreateSessionRequest {
    /// Create a request with the given name and dates, using the name as the
    /// academic year label.
    #[must_use]
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let name = name.into();
        Self {
            academic_year: name.clone(),
            name,
            start_date,
            end_date,
            description: None,
            promotion_criteria: None,
        }
    }
}

/// Result of completing a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReport {
    /// The completed session.
    pub session: Session,
    /// Promotion report, present when auto-promotion was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PromotionReport>,
}

/// Aggregate figures for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionAnalytics {
    /// The session described.
    pub session_id: SessionId,
    /// Session name.
    pub name: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Non-deleted students attached to the session.
    pub student_count: usize,
    /// Classes of the session.
    pub class_count: usize,
    /// Classes still marked active.
    pub active_class_count: usize,
    /// Attendance marks recorded for the attached students.
    pub attendance_records: usize,
    /// Students by promotion status.
    pub promotion: PromotionBreakdown,
}

// =============================================================================
// Promotion
// =============================================================================

/// Request to promote one student.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromoteRequest {
    /// Grade to move to. Looked up in the grade ladder if not provided.
    #[serde(default)]
    pub next_grade: Option<String>,
    /// Section to move to. Keeps the current section if not provided.
    #[serde(default)]
    pub next_section: Option<String>,
    /// Notes recorded with the promotion.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to promote an explicit list of students.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkPromoteRequest {
    /// Session the students must be attached to.
    pub session_id: SessionId,
    /// Students to promote.
    pub student_ids: Vec<StudentId>,
    /// Grade to move to. Looked up per student if not provided.
    #[serde(default)]
    pub next_grade: Option<String>,
    /// Section to move to.
    #[serde(default)]
    pub next_section: Option<String>,
    /// Notes recorded with each promotion.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Verdict for one student in a session-wide evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentVerdict {
    /// The student evaluated.
    pub student_id: StudentId,
    /// Student name.
    pub name: String,
    /// Grade at evaluation time.
    pub grade: String,
    /// The evaluator's verdict.
    pub verdict: Verdict,
    /// Whether the promotion was applied.
    pub promoted: bool,
}

/// Result of evaluating every student of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionReport {
    /// The session evaluated.
    pub session_id: SessionId,
    /// Per-student verdicts.
    pub students: Vec<StudentVerdict>,
    /// Students meeting the criteria.
    pub eligible_count: usize,
    /// Students below the criteria.
    pub ineligible_count: usize,
    /// Students whose promotion was applied.
    pub promoted_count: usize,
}

/// Students by promotion status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionBreakdown {
    /// No decision yet.
    pub pending: usize,
    /// Advanced to the next grade.
    pub promoted: usize,
    /// Kept in their grade.
    pub retained: usize,
    /// Left the grade ladder.
    pub graduated: usize,
}

/// Promotion progress of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionStatusReport {
    /// The session described.
    pub session_id: SessionId,
    /// Session name.
    pub session_name: String,
    /// Non-deleted students attached to the session.
    pub total_students: usize,
    /// Students by promotion status.
    pub by_status: PromotionBreakdown,
    /// Students by current grade.
    pub by_grade: BTreeMap<String, usize>,
}

// =============================================================================
// Attendance
// =============================================================================

/// One entry of a bulk attendance request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceMark {
    /// Student being marked.
    pub student_id: StudentId,
    /// Status for the day.
    pub status: AttendanceStatus,
}

/// Request to mark attendance for many students on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAttendanceRequest {
    /// Session the marks belong to.
    pub session_id: SessionId,
    /// Calendar day.
    pub date: NaiveDate,
    /// One entry per student.
    pub records: Vec<AttendanceMark>,
}

/// A student's attendance in one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
    /// The student.
    pub student_id: StudentId,
    /// The session.
    pub session_id: SessionId,
    /// Days with a mark.
    pub total_days: u32,
    /// Days marked present.
    pub present_days: u32,
    /// Attendance percentage rounded to two decimals.
    pub percentage: f64,
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the control service.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Section assigned to promoted students that have none.
    pub default_section: String,
    /// Criteria used when a new session doesn't specify any.
    pub default_criteria: PromotionCriteria,
    /// Notes recorded on students promoted by a rollover.
    pub rollover_notes: String,
    /// Notes recorded on students retained by a rollover.
    pub retained_notes: String,
    /// Notes recorded on students promoted when their session completes.
    pub completion_notes: String,
    /// Notes recorded on manual promotions that don't provide any.
    pub manual_notes: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            default_section: "A".to_string(),
            default_criteria: PromotionCriteria::default(),
            rollover_notes: "Auto rollover".to_string(),
            retained_notes: "Below attendance criteria".to_string(),
            completion_notes: "Auto promotion on session completion".to_string(),
            manual_notes: "Manual promotion".to_string(),
        }
    }
}
