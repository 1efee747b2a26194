//! Promotion evaluation and application.
//!
//! The [`PromotionEvaluator`] trait is the seam between the session registry,
//! the rollover orchestrator and the eligibility rules. [`AttendanceEvaluator`]
//! is the store-backed implementation used in production.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use scholaris_core::{next_grade, NextGrade, SessionId, StudentId};
use scholaris_store::{PromotionStatus, Session, SessionStatus, Store, Student};
use serde::{Deserialize, Serialize};

use crate::attendance::{attendance_summary, ensure_attached};
use crate::bulk::{run_bulk, BulkOutcome};
use crate::error::{ControlError, Result};
use crate::types::{
    BulkPromoteRequest, ControlConfig, PromoteRequest, PromotionBreakdown, PromotionReport,
    PromotionStatusReport, StudentVerdict,
};

/// Grade value recorded on graduated students.
pub const GRADUATED_GRADE: &str = "graduated";

/// Section value recorded on graduated students.
pub const GRADUATED_SECTION: &str = "N/A";

// =============================================================================
// Evaluation
// =============================================================================

/// Outcome of the grade-based criteria.
///
/// `minimum_grade` and `require_all_subjects` are carried on every session but
/// there is no results data to check them against, so they never affect a
/// verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeCheck {
    /// The grade criteria were not checked.
    NotEvaluated,
}

/// Eligibility verdict for one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the student meets the criteria.
    pub eligible: bool,
    /// Human-readable explanation.
    pub reason: String,
    /// Attendance percentage at full precision.
    pub percentage: f64,
    /// Days with a mark.
    pub total_days: u32,
    /// Days marked present.
    pub present_days: u32,
    /// Outcome of the grade criteria.
    pub grade_check: GradeCheck,
}

/// Decides whether a student may be promoted out of a session.
pub trait PromotionEvaluator: Send + Sync {
    /// Evaluate `student` against the criteria of `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data needed for the decision cannot be read.
    fn evaluate(&self, student: &Student, session: &Session) -> Result<Verdict>;
}

/// Evaluates eligibility from recorded attendance.
pub struct AttendanceEvaluator<S: Store> {
    store: Arc<S>,
}

impl<S: Store> AttendanceEvaluator<S> {
    /// Create an evaluator reading from `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: Store> PromotionEvaluator for AttendanceEvaluator<S> {
    fn evaluate(&self, student: &Student, session: &Session) -> Result<Verdict> {
        let summary = attendance_summary(&*self.store, &student.student_id, &session.session_id)?;
        let percentage = summary.percentage();
        let minimum = session.promotion_criteria.minimum_attendance;

        // TODO: check minimum_grade and require_all_subjects once exam results are stored.
        let (eligible, reason) = if percentage < minimum {
            (
                false,
                format!(
                    "Attendance below minimum requirement ({}% < {minimum}%)",
                    summary.rounded_percentage()
                ),
            )
        } else {
            (true, "All criteria met".to_string())
        };

        Ok(Verdict {
            eligible,
            reason,
            percentage,
            total_days: summary.total_days,
            present_days: summary.present_days,
            grade_check: GradeCheck::NotEvaluated,
        })
    }
}

// =============================================================================
// Application
// =============================================================================

/// Move a student to `target`, recording where they came from.
///
/// Graduation clears the current session. A regular promotion leaves it to
/// the caller. Returns true if the student graduated.
pub(crate) fn advance(
    student: &mut Student,
    target: NextGrade,
    next_section: Option<&str>,
    notes: &str,
    default_section: &str,
    now: DateTime<Utc>,
) -> bool {
    student.previous_grade = Some(student.grade.clone());
    student.previous_section = Some(student.section.clone());
    student.promotion_date = Some(now);
    student.promotion_notes = Some(notes.to_string());
    student.updated_at = now;

    match target {
        NextGrade::Graduate => {
            student.promotion_status = PromotionStatus::Graduated;
            student.grade = GRADUATED_GRADE.to_string();
            student.section = GRADUATED_SECTION.to_string();
            student.current_session = None;
            true
        }
        NextGrade::Grade(grade) => {
            student.promotion_status = PromotionStatus::Promoted;
            student.grade = grade;
            if let Some(section) = next_section {
                student.section = section.to_string();
            } else if student.section.trim().is_empty() {
                student.section = default_section.to_string();
            }
            false
        }
    }
}

/// Where a manual promotion sends the student.
fn manual_target(student: &Student, next_grade_override: Option<&str>) -> NextGrade {
    next_grade_override
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map_or_else(
            || next_grade(&student.grade),
            |g| NextGrade::Grade(g.to_string()),
        )
}

fn load_session<S: Store + ?Sized>(store: &S, session_id: &SessionId) -> Result<Session> {
    store
        .get_session(session_id)?
        .ok_or(ControlError::SessionNotFound(*session_id))
}

fn load_student<S: Store + ?Sized>(store: &S, student_id: &StudentId) -> Result<Student> {
    store
        .get_student(student_id)?
        .filter(|s| !s.deleted)
        .ok_or(ControlError::StudentNotFound(*student_id))
}

/// Non-deleted students attached to a session.
pub(crate) fn active_students<S: Store + ?Sized>(
    store: &S,
    session_id: &SessionId,
) -> Result<Vec<Student>> {
    Ok(store
        .list_students_by_session(session_id)?
        .into_iter()
        .filter(|s| !s.deleted)
        .collect())
}

// =============================================================================
// Operations
// =============================================================================

/// Evaluate every student of a completed session, optionally promoting the
/// eligible ones.
///
/// # Errors
///
/// Returns `ControlError::SessionNotFound` if the session doesn't exist, or
/// `ControlError::InvalidState` if it is not completed.
pub fn evaluate_promotions<S: Store + ?Sized>(
    store: &S,
    evaluator: &dyn PromotionEvaluator,
    config: &ControlConfig,
    session_id: &SessionId,
    auto_promote: bool,
) -> Result<PromotionReport> {
    let session = load_session(store, session_id)?;
    if session.status != SessionStatus::Completed {
        return Err(ControlError::InvalidState(format!(
            "session {} must be completed before promotions are evaluated",
            session.name
        )));
    }

    let mut report = PromotionReport {
        session_id: *session_id,
        students: Vec::new(),
        eligible_count: 0,
        ineligible_count: 0,
        promoted_count: 0,
    };

    for mut student in active_students(store, session_id)? {
        let verdict = evaluator.evaluate(&student, &session)?;
        let (student_id, name, grade) =
            (student.student_id, student.name.clone(), student.grade.clone());

        let mut promoted = false;
        if verdict.eligible {
            report.eligible_count += 1;
            if auto_promote {
                let target = next_grade(&student.grade);
                advance(
                    &mut student,
                    target,
                    None,
                    &config.completion_notes,
                    &config.default_section,
                    Utc::now(),
                );
                store.put_student(&student)?;
                report.promoted_count += 1;
                promoted = true;
            }
        } else {
            report.ineligible_count += 1;
        }

        report.students.push(StudentVerdict {
            student_id,
            name,
            grade,
            verdict,
            promoted,
        });
    }

    tracing::info!(
        session_id = %session_id,
        eligible = report.eligible_count,
        ineligible = report.ineligible_count,
        promoted = report.promoted_count,
        "Evaluated promotions"
    );

    Ok(report)
}

/// Promote one student after checking eligibility.
///
/// # Errors
///
/// Returns `ControlError::StudentNotFound` if the student doesn't exist,
/// `ControlError::InvalidState` if they are not attached to a session, or
/// `ControlError::NotEligible` if they don't meet the criteria.
pub fn promote_student<S: Store + ?Sized>(
    store: &S,
    evaluator: &dyn PromotionEvaluator,
    config: &ControlConfig,
    student_id: &StudentId,
    request: PromoteRequest,
) -> Result<Student> {
    let mut student = load_student(store, student_id)?;
    let session_id = student.current_session.ok_or_else(|| {
        ControlError::InvalidState(format!("student {student_id} is not attached to a session"))
    })?;
    let session = load_session(store, &session_id)?;

    let verdict = evaluator.evaluate(&student, &session)?;
    if !verdict.eligible {
        return Err(ControlError::NotEligible {
            student_id: *student_id,
            reason: verdict.reason,
        });
    }

    let target = manual_target(&student, request.next_grade.as_deref());
    let notes = request.notes.as_deref().unwrap_or(&config.manual_notes);
    let graduated = advance(
        &mut student,
        target,
        request.next_section.as_deref(),
        notes,
        &config.default_section,
        Utc::now(),
    );
    store.put_student(&student)?;

    tracing::info!(
        student_id = %student_id,
        grade = %student.grade,
        graduated,
        "Promoted student"
    );

    Ok(student)
}

/// Promote an explicit list of students.
///
/// The list is an administrative decision, so eligibility is not re-checked.
/// Each student must exist and be attached to the given session.
///
/// # Errors
///
/// Returns `ControlError::SessionNotFound` if the session doesn't exist.
pub fn bulk_promote<S: Store + ?Sized>(
    store: &S,
    config: &ControlConfig,
    request: BulkPromoteRequest,
) -> Result<BulkOutcome<Student>> {
    let session = load_session(store, &request.session_id)?;
    let notes = request.notes.as_deref().unwrap_or(&config.manual_notes);
    let now = Utc::now();

    let outcome = run_bulk(
        request.student_ids.iter().copied(),
        ToString::to_string,
        |student_id| {
            let mut student = load_student(store, &student_id)?;
            ensure_attached(&student, &session.session_id)?;

            let target = manual_target(&student, request.next_grade.as_deref());
            advance(
                &mut student,
                target,
                request.next_section.as_deref(),
                notes,
                &config.default_section,
                now,
            );
            store.put_student(&student)?;
            Ok(student)
        },
    );

    tracing::info!(
        session_id = %session.session_id,
        promoted = outcome.succeeded_count,
        failed = outcome.errors.len(),
        "Bulk promotion finished"
    );

    Ok(outcome)
}

/// Count the students of a session by promotion status and grade.
///
/// # Errors
///
/// Returns `ControlError::SessionNotFound` if the session doesn't exist.
pub fn promotion_status<S: Store + ?Sized>(
    store: &S,
    session_id: &SessionId,
) -> Result<PromotionStatusReport> {
    let session = load_session(store, session_id)?;
    let students = active_students(store, session_id)?;

    let mut by_grade = BTreeMap::new();
    for student in &students {
        *by_grade.entry(student.grade.clone()).or_insert(0) += 1;
    }

    Ok(PromotionStatusReport {
        session_id: *session_id,
        session_name: session.name,
        total_students: students.len(),
        by_status: breakdown(&students),
        by_grade,
    })
}

/// Tally students by promotion status.
pub(crate) fn breakdown(students: &[Student]) -> PromotionBreakdown {
    let mut counts = PromotionBreakdown::default();
    for student in students {
        match student.promotion_status {
            PromotionStatus::Pending => counts.pending += 1,
            PromotionStatus::Promoted => counts.promoted += 1,
            PromotionStatus::Retained => counts.retained += 1,
            PromotionStatus::Graduated => counts.graduated += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{open_store, seed_attendance, seed_session, seed_student};
    use scholaris_store::RocksStore;

    fn evaluator(store: &Arc<RocksStore>) -> AttendanceEvaluator<RocksStore> {
        AttendanceEvaluator::new(Arc::clone(store))
    }

    #[test]
    fn eligible_at_threshold() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let student = seed_student(&store, &session, "3", "A");
        seed_attendance(&store, &student, &session, 3, 4);

        let verdict = evaluator(&store).evaluate(&student, &session).unwrap();
        assert!(verdict.eligible);
        assert_eq!(verdict.reason, "All criteria met");
        assert!((verdict.percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn ineligible_below_threshold() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let student = seed_student(&store, &session, "3", "A");
        seed_attendance(&store, &student, &session, 2, 3);

        let verdict = evaluator(&store).evaluate(&student, &session).unwrap();
        assert!(!verdict.eligible);
        assert_eq!(
            verdict.reason,
            "Attendance below minimum requirement (66.67% < 75%)"
        );
        assert_eq!(verdict.total_days, 3);
        assert_eq!(verdict.present_days, 2);
    }

    #[test]
    fn no_attendance_is_ineligible() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let student = seed_student(&store, &session, "3", "A");

        let verdict = evaluator(&store).evaluate(&student, &session).unwrap();
        assert!(!verdict.eligible);
        assert!(verdict.percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn grade_criteria_are_not_evaluated() {
        let (store, _dir) = open_store();
        let mut session = seed_session(&store, "2025-2026", SessionStatus::Active);
        session.promotion_criteria.minimum_grade = "A+".to_string();
        session.promotion_criteria.require_all_subjects = true;
        let student = seed_student(&store, &session, "3", "A");
        seed_attendance(&store, &student, &session, 10, 10);

        let verdict = evaluator(&store).evaluate(&student, &session).unwrap();
        assert!(verdict.eligible);
        assert_eq!(verdict.grade_check, GradeCheck::NotEvaluated);
    }

    #[test]
    fn advance_keeps_section_and_records_history() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let mut student = seed_student(&store, &session, "10", "B");

        let graduated = advance(
            &mut student,
            NextGrade::Grade("11".into()),
            None,
            "Auto rollover",
            "A",
            Utc::now(),
        );

        assert!(!graduated);
        assert_eq!(student.grade, "11");
        assert_eq!(student.section, "B");
        assert_eq!(student.previous_grade.as_deref(), Some("10"));
        assert_eq!(student.previous_section.as_deref(), Some("B"));
        assert_eq!(student.promotion_status, PromotionStatus::Promoted);
        assert_eq!(student.current_session, Some(session.session_id));
    }

    #[test]
    fn advance_defaults_empty_section() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let mut student = seed_student(&store, &session, "4", "");

        advance(&mut student, next_grade("4"), None, "n", "A", Utc::now());
        assert_eq!(student.section, "A");
    }

    #[test]
    fn advance_graduates() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let mut student = seed_student(&store, &session, "12", "C");

        let graduated = advance(&mut student, next_grade("12"), None, "n", "A", Utc::now());

        assert!(graduated);
        assert_eq!(student.grade, GRADUATED_GRADE);
        assert_eq!(student.section, GRADUATED_SECTION);
        assert_eq!(student.promotion_status, PromotionStatus::Graduated);
        assert!(student.current_session.is_none());
    }

    #[test]
    fn evaluate_requires_completed_session() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let config = ControlConfig::default();

        let result =
            evaluate_promotions(&*store, &evaluator(&store), &config, &session.session_id, false);
        assert!(matches!(result, Err(ControlError::InvalidState(_))));
    }

    #[test]
    fn evaluate_and_auto_promote() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Completed);
        let good = seed_student(&store, &session, "5", "A");
        let poor = seed_student(&store, &session, "5", "B");
        seed_attendance(&store, &good, &session, 9, 10);
        seed_attendance(&store, &poor, &session, 1, 10);
        let config = ControlConfig::default();

        let dry =
            evaluate_promotions(&*store, &evaluator(&store), &config, &session.session_id, false)
                .unwrap();
        assert_eq!(dry.eligible_count, 1);
        assert_eq!(dry.ineligible_count, 1);
        assert_eq!(dry.promoted_count, 0);
        assert_eq!(store.get_student(&good.student_id).unwrap().unwrap().grade, "5");

        let applied =
            evaluate_promotions(&*store, &evaluator(&store), &config, &session.session_id, true)
                .unwrap();
        assert_eq!(applied.promoted_count, 1);

        let good = store.get_student(&good.student_id).unwrap().unwrap();
        assert_eq!(good.grade, "6");
        assert_eq!(good.promotion_status, PromotionStatus::Promoted);
        let poor = store.get_student(&poor.student_id).unwrap().unwrap();
        assert_eq!(poor.grade, "5");
        assert_eq!(poor.promotion_status, PromotionStatus::Pending);
    }

    #[test]
    fn promote_student_checks_eligibility() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let student = seed_student(&store, &session, "7", "A");
        seed_attendance(&store, &student, &session, 1, 4);
        let config = ControlConfig::default();

        let result = promote_student(
            &*store,
            &evaluator(&store),
            &config,
            &student.student_id,
            PromoteRequest::default(),
        );
        assert!(matches!(result, Err(ControlError::NotEligible { .. })));
        assert_eq!(store.get_student(&student.student_id).unwrap().unwrap().grade, "7");
    }

    #[test]
    fn promote_student_with_overrides() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let student = seed_student(&store, &session, "7", "A");
        seed_attendance(&store, &student, &session, 4, 4);
        let config = ControlConfig::default();

        let promoted = promote_student(
            &*store,
            &evaluator(&store),
            &config,
            &student.student_id,
            PromoteRequest {
                next_grade: Some("9".into()),
                next_section: Some("C".into()),
                notes: Some("Skipped a grade".into()),
            },
        )
        .unwrap();

        assert_eq!(promoted.grade, "9");
        assert_eq!(promoted.section, "C");
        assert_eq!(promoted.promotion_notes.as_deref(), Some("Skipped a grade"));
        // Manual promotion stays in the session until rollover moves it
        assert_eq!(promoted.current_session, Some(session.session_id));
    }

    #[test]
    fn promote_missing_student() {
        let (store, _dir) = open_store();
        let result = promote_student(
            &*store,
            &evaluator(&store),
            &ControlConfig::default(),
            &StudentId::generate(),
            PromoteRequest::default(),
        );
        assert!(matches!(result, Err(ControlError::StudentNotFound(_))));
    }

    #[test]
    fn bulk_promote_partial_failure() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Completed);
        let a = seed_student(&store, &session, "2", "A");
        let b = seed_student(&store, &session, "12", "A");
        let missing = StudentId::generate();

        let outcome = bulk_promote(
            &*store,
            &ControlConfig::default(),
            BulkPromoteRequest {
                session_id: session.session_id,
                student_ids: vec![a.student_id, missing, b.student_id],
                next_grade: None,
                next_section: None,
                notes: None,
            },
        )
        .unwrap();

        assert_eq!(outcome.succeeded_count, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].key, missing.to_string());
        assert!(store.get_student(&missing).unwrap().is_none());

        // No attendance at all, yet both were promoted
        assert_eq!(store.get_student(&a.student_id).unwrap().unwrap().grade, "3");
        let b = store.get_student(&b.student_id).unwrap().unwrap();
        assert_eq!(b.promotion_status, PromotionStatus::Graduated);
    }

    #[test]
    fn bulk_promote_rejects_students_of_other_sessions() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let other = seed_session(&store, "2024-2025", SessionStatus::Completed);
        let stranger = seed_student(&store, &other, "4", "A");

        let outcome = bulk_promote(
            &*store,
            &ControlConfig::default(),
            BulkPromoteRequest {
                session_id: session.session_id,
                student_ids: vec![stranger.student_id],
                next_grade: None,
                next_section: None,
                notes: None,
            },
        )
        .unwrap();

        assert_eq!(outcome.succeeded_count, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(
            store.get_student(&stranger.student_id).unwrap().unwrap().grade,
            "4"
        );
    }

    #[test]
    fn status_counts_by_status_and_grade() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        seed_student(&store, &session, "5", "A");
        seed_student(&store, &session, "5", "B");
        let mut retained = seed_student(&store, &session, "6", "A");
        retained.promotion_status = PromotionStatus::Retained;
        store.put_student(&retained).unwrap();
        let mut gone = seed_student(&store, &session, "6", "B");
        gone.deleted = true;
        store.put_student(&gone).unwrap();

        let report = promotion_status(&*store, &session.session_id).unwrap();
        assert_eq!(report.total_students, 3);
        assert_eq!(report.by_status.pending, 2);
        assert_eq!(report.by_status.retained, 1);
        assert_eq!(report.by_grade.get("5"), Some(&2));
        assert_eq!(report.by_grade.get("6"), Some(&1));
    }
}
