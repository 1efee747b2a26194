//! Attendance aggregation and bulk marking.

use chrono::Utc;
use scholaris_core::{SessionId, StudentId};
use scholaris_store::{Attendance, AttendanceStatus, Store, Student};
use serde::{Deserialize, Serialize};

use crate::bulk::{run_bulk, BulkOutcome};
use crate::error::{ControlError, Result};
use crate::types::{AttendanceMark, AttendanceReport, MarkAttendanceRequest};

/// Attendance totals for one student in one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// Days with a mark.
    pub total_days: u32,
    /// Days marked present. Late days don't count.
    pub present_days: u32,
}

impl AttendanceSummary {
    /// Present days over total days, as a percentage at full precision.
    ///
    /// Zero when no day has been marked.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        f64::from(self.present_days) / f64::from(self.total_days) * 100.0
    }

    /// The percentage rounded to two decimals, for display.
    #[must_use]
    pub fn rounded_percentage(&self) -> f64 {
        (self.percentage() * 100.0).round() / 100.0
    }
}

/// Count a student's marks in a session.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn attendance_summary<S: Store + ?Sized>(
    store: &S,
    student_id: &StudentId,
    session_id: &SessionId,
) -> Result<AttendanceSummary> {
    let marks = store.list_attendance(student_id, session_id)?;

    let present = marks
        .iter()
        .filter(|m| m.status == AttendanceStatus::Present)
        .count();

    Ok(AttendanceSummary {
        total_days: saturating_u32(marks.len()),
        present_days: saturating_u32(present),
    })
}

/// Build the attendance report for a student, checking both ends exist.
///
/// # Errors
///
/// Returns `ControlError::StudentNotFound` or `ControlError::SessionNotFound`
/// if either record is missing.
pub fn attendance_report<S: Store + ?Sized>(
    store: &S,
    student_id: &StudentId,
    session_id: &SessionId,
) -> Result<AttendanceReport> {
    store
        .get_student(student_id)?
        .ok_or(ControlError::StudentNotFound(*student_id))?;
    store
        .get_session(session_id)?
        .ok_or(ControlError::SessionNotFound(*session_id))?;

    let summary = attendance_summary(store, student_id, session_id)?;

    Ok(AttendanceReport {
        student_id: *student_id,
        session_id: *session_id,
        total_days: summary.total_days,
        present_days: summary.present_days,
        percentage: summary.rounded_percentage(),
    })
}

/// Record one day of attendance for many students.
///
/// The session is checked up front. After that, each entry succeeds or fails
/// on its own: the student must exist, be attached to the session and not
/// already be marked for the day.
///
/// # Errors
///
/// Returns `ControlError::SessionNotFound` if the session doesn't exist.
pub fn mark_attendance<S: Store + ?Sized>(
    store: &S,
    request: MarkAttendanceRequest,
) -> Result<BulkOutcome<Attendance>> {
    let session = store
        .get_session(&request.session_id)?
        .ok_or(ControlError::SessionNotFound(request.session_id))?;
    let date = request.date;

    let outcome = run_bulk(
        request.records,
        |mark| mark.student_id.to_string(),
        |mark: AttendanceMark| {
            let student = store
                .get_student(&mark.student_id)?
                .filter(|s| !s.deleted)
                .ok_or(ControlError::StudentNotFound(mark.student_id))?;
            ensure_attached(&student, &session.session_id)?;

            let record = Attendance {
                student_id: mark.student_id,
                session_id: session.session_id,
                date,
                status: mark.status,
                marked_at: Utc::now(),
            };
            store.insert_attendance(&record)?;
            Ok(record)
        },
    );

    tracing::info!(
        session_id = %session.session_id,
        date = %date,
        marked = outcome.succeeded_count,
        failed = outcome.errors.len(),
        "Marked attendance"
    );

    Ok(outcome)
}

/// Fail unless the student's current session is `session_id`.
pub(crate) fn ensure_attached(student: &Student, session_id: &SessionId) -> Result<()> {
    if student.current_session == Some(*session_id) {
        Ok(())
    } else {
        Err(ControlError::InvalidState(format!(
            "student {} is not attached to session {session_id}",
            student.student_id
        )))
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, open_store, seed_attendance, seed_session, seed_student};
    use scholaris_store::SessionStatus;

    #[test]
    fn percentage_is_zero_without_marks() {
        let summary = AttendanceSummary::default();
        assert!(summary.percentage().abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_keeps_full_precision() {
        let summary = AttendanceSummary {
            total_days: 3,
            present_days: 2,
        };
        assert!((summary.percentage() - 200.0 / 3.0).abs() < 1e-9);
        assert!((summary.rounded_percentage() - 66.67).abs() < 1e-9);
    }

    #[test]
    fn only_present_counts() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let student = seed_student(&store, &session, "5", "A");

        for (day, status) in [
            (2, AttendanceStatus::Present),
            (3, AttendanceStatus::Late),
            (4, AttendanceStatus::Absent),
            (5, AttendanceStatus::Present),
        ] {
            store
                .insert_attendance(&Attendance {
                    student_id: student.student_id,
                    session_id: session.session_id,
                    date: date(2025, 6, day),
                    status,
                    marked_at: Utc::now(),
                })
                .unwrap();
        }

        let summary =
            attendance_summary(&*store, &student.student_id, &session.session_id).unwrap();
        assert_eq!(summary.total_days, 4);
        assert_eq!(summary.present_days, 2);
        assert!((summary.percentage() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn summary_is_scoped_to_session() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let other = seed_session(&store, "2024-2025", SessionStatus::Completed);
        let student = seed_student(&store, &session, "5", "A");
        seed_attendance(&store, &student, &other, 10, 10);

        let summary =
            attendance_summary(&*store, &student.student_id, &session.session_id).unwrap();
        assert_eq!(summary.total_days, 0);
    }

    #[test]
    fn bulk_mark_collects_item_errors() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let other = seed_session(&store, "2024-2025", SessionStatus::Completed);
        let attached = seed_student(&store, &session, "5", "A");
        let elsewhere = seed_student(&store, &other, "5", "A");
        let missing = StudentId::generate();

        let request = MarkAttendanceRequest {
            session_id: session.session_id,
            date: date(2025, 7, 1),
            records: vec![
                AttendanceMark {
                    student_id: attached.student_id,
                    status: AttendanceStatus::Present,
                },
                AttendanceMark {
                    student_id: elsewhere.student_id,
                    status: AttendanceStatus::Present,
                },
                AttendanceMark {
                    student_id: missing,
                    status: AttendanceStatus::Absent,
                },
            ],
        };

        let outcome = mark_attendance(&*store, request.clone()).unwrap();
        assert_eq!(outcome.succeeded_count, 1);
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(outcome.errors[1].key, missing.to_string());

        // Same day again is an item error, not a failure of the request
        let again = mark_attendance(&*store, request).unwrap();
        assert_eq!(again.succeeded_count, 0);
        assert_eq!(again.errors.len(), 3);
        assert_eq!(
            store
                .list_attendance(&attached.student_id, &session.session_id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn bulk_mark_unknown_session_fails_fast() {
        let (store, _dir) = open_store();
        let request = MarkAttendanceRequest {
            session_id: SessionId::generate(),
            date: date(2025, 7, 1),
            records: vec![],
        };
        assert!(matches!(
            mark_attendance(&*store, request),
            Err(ControlError::SessionNotFound(_))
        ));
    }

    #[test]
    fn report_rounds_and_checks_existence() {
        let (store, _dir) = open_store();
        let session = seed_session(&store, "2025-2026", SessionStatus::Active);
        let student = seed_student(&store, &session, "5", "A");
        seed_attendance(&store, &student, &session, 2, 3);

        let report = attendance_report(&*store, &student.student_id, &session.session_id).unwrap();
        assert_eq!(report.total_days, 3);
        assert!((report.percentage - 66.67).abs() < 1e-9);

        assert!(matches!(
            attendance_report(&*store, &StudentId::generate(), &session.session_id),
            Err(ControlError::StudentNotFound(_))
        ));
    }
}
