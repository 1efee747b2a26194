//! Domain types stored in the database.
//!
//! These types represent the persisted state of sessions, classes, students,
//! attendance and rollover runs.

use chrono::{DateTime, NaiveDate, Utc};
use scholaris_core::{ClassId, RunId, SessionId, StudentId, TeacherId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Sessions
// =============================================================================

/// An academic session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for the session.
    pub session_id: SessionId,
    /// Unique human-readable name, e.g. `2025-2026`.
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
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Whether this is the current session. At most one session has this set.
    pub is_current: bool,
    /// Criteria applied when evaluating promotions out of this session.
    pub promotion_criteria: PromotionCriteria,
    /// Snapshot taken when the session was archived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_data: Option<ArchivedData>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// When the session was completed.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// When the session was archived.
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The session is running.
    Active,
    /// The school year has ended.
    Completed,
    /// Terminal. A snapshot has been taken.
    Archived,
}

/// Promotion criteria attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionCriteria {
    /// Minimum attendance percentage, 0-100.
    pub minimum_attendance: f64,
    /// Minimum grade. Declared but not evaluated.
    pub minimum_grade: String,
    /// Whether all subjects must be passed. Declared but not evaluated.
    pub require_all_subjects: bool,
}

impl Default for PromotionCriteria {
    fn default() -> Self {
        Self {
            minimum_attendance: 75.0,
            minimum_grade: "D".to_string(),
            require_all_subjects: false,
        }
    }
}

/// Snapshot of a session's students and classes at archive time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedData {
    /// Students attached to the session when it was archived.
    pub students: Vec<ArchivedStudent>,
    /// Classes of the session.
    pub classes: Vec<ArchivedClass>,
    /// When the snapshot was taken.
    pub archived_at: DateTime<Utc>,
}

/// A student entry in an archive snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedStudent {
    /// Student id.
    pub student_id: StudentId,
    /// Student name.
    pub name: String,
    /// Final grade in this session.
    pub grade: String,
    /// Final section in this session.
    pub section: String,
    /// Promotion status at archive time.
    pub promotion_status: PromotionStatus,
}

/// A class entry in an archive snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedClass {
    /// Class id.
    pub class_id: ClassId,
    /// Class name.
    pub name: String,
    /// Section.
    pub section: String,
    /// Number of students at archive time.
    pub current_strength: u32,
}

// =============================================================================
// Classes
// =============================================================================

/// A class record. One per (name, section, session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    /// Unique identifier for the class.
    pub class_id: ClassId,
    /// Class name, usually the grade code.
    pub name: String,
    /// Section letter.
    pub section: String,
    /// Academic year label of the owning session.
    pub academic_year: String,
    /// Owning session.
    pub session_id: SessionId,
    /// Name of the owning session, resolved when the class was written.
    pub session_name: String,
    /// Seat capacity.
    pub capacity: u32,
    /// Number of enrolled students.
    pub current_strength: u32,
    /// False once the owning session has rolled over.
    pub is_active_session: bool,
    /// When the owning session rolled over.
    #[serde(default)]
    pub session_end_date: Option<DateTime<Utc>>,
    /// Class teacher.
    #[serde(default)]
    pub class_teacher: Option<TeacherId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Students
// =============================================================================

/// A student record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier for the student.
    pub student_id: StudentId,
    /// Full name.
    pub name: String,
    /// Roll number within the class.
    #[serde(default)]
    pub roll_number: Option<String>,
    /// Current grade code.
    pub grade: String,
    /// Current section.
    pub section: String,
    /// Session the student is attached to. `None` after graduation.
    pub current_session: Option<SessionId>,
    /// Outcome of the most recent promotion decision.
    pub promotion_status: PromotionStatus,
    /// Grade before the last promotion.
    #[serde(default)]
    pub previous_grade: Option<String>,
    /// Section before the last promotion.
    #[serde(default)]
    pub previous_section: Option<String>,
    /// When the student was last promoted.
    #[serde(default)]
    pub promotion_date: Option<DateTime<Utc>>,
    /// Notes recorded with the last promotion decision.
    #[serde(default)]
    pub promotion_notes: Option<String>,
    /// Rollover run that last processed this student.
    #[serde(default)]
    pub last_rollover_run: Option<RunId>,
    /// Soft-delete flag.
    #[serde(default)]
    pub deleted: bool,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Promotion outcome for a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionStatus {
    /// No decision yet.
    Pending,
    /// Advanced to the next grade.
    Promoted,
    /// Kept in the current grade.
    Retained,
    /// Left the grade ladder.
    Graduated,
}

// =============================================================================
// Attendance
// =============================================================================

/// One attendance mark for a student on a given day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    /// Student the mark belongs to.
    pub student_id: StudentId,
    /// Session the mark was recorded in.
    pub session_id: SessionId,
    /// Calendar day.
    pub date: NaiveDate,
    /// Attendance status for the day.
    pub status: AttendanceStatus,
    /// When the mark was recorded.
    pub marked_at: DateTime<Utc>,
}

/// Attendance status for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Attended.
    Present,
    /// Did not attend.
    Absent,
    /// Arrived late.
    Late,
}

// =============================================================================
// Rollover runs
// =============================================================================

/// Audit record of one rollover attempt.
///
/// A run in [`RolloverStatus::Running`] also acts as the lock for its source
/// session: the store refuses to begin a second running run for the same source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloverRun {
    /// Unique identifier for the run.
    pub run_id: RunId,
    /// Session being rolled over.
    pub source_session_id: SessionId,
    /// Name of the source session.
    pub source_session_name: String,
    /// Session created by the run, once created.
    #[serde(default)]
    pub target_session_id: Option<SessionId>,
    /// Name of the created session, once created.
    #[serde(default)]
    pub target_session_name: Option<String>,
    /// Current status.
    pub status: RolloverStatus,
    /// Outcome counters.
    pub counts: RolloverCounts,
    /// Last step whose effects are fully persisted.
    #[serde(default)]
    pub last_completed_step: Option<RolloverStep>,
    /// Human-readable outcome or error text.
    #[serde(default)]
    pub message: Option<String>,
    /// When the run (or its latest resume) started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Status of a rollover run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloverStatus {
    /// In progress, or interrupted without being marked failed.
    Running,
    /// Finished successfully.
    Completed,
    /// Stopped on an error.
    Failed,
}

/// Counters recorded on a rollover run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloverCounts {
    /// Classes created in the target session.
    pub classes_copied: u32,
    /// Students promoted, graduates included.
    pub promoted: u32,
    /// Subset of `promoted` that graduated.
    pub graduated: u32,
    /// Students retained in the source session.
    pub retained: u32,
}

/// Persisted steps of the rollover saga, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloverStep {
    /// The target session exists.
    CreateSession,
    /// Source classes are copied into the target session.
    CopyClasses,
    /// Every student of the source session has been evaluated.
    MigrateStudents,
    /// Source classes are deactivated.
    DeactivateClasses,
}

impl RolloverStep {
    /// All steps in execution order.
    pub const ALL: [Self; 4] = [
        Self::CreateSession,
        Self::CopyClasses,
        Self::MigrateStudents,
        Self::DeactivateClasses,
    ];

    /// Steps that still need to run after `last` completed.
    #[must_use]
    pub fn remaining_after(last: Option<Self>) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|step| last.map_or(true, |done| *step > done))
            .collect()
    }
}
