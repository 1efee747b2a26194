//! Session rollover orchestration.
//!
//! A rollover closes one session and opens the next. It runs as a saga of
//! persisted steps:
//!
//! 1. [`RolloverStep::CreateSession`]: create the next session and make it current
//! 2. [`RolloverStep::CopyClasses`]: copy every class into the new session
//! 3. [`RolloverStep::MigrateStudents`]: evaluate and move every student
//! 4. [`RolloverStep::DeactivateClasses`]: deactivate the source classes
//!
//! Every step is idempotent and the run records the last step it finished,
//! so a failed or interrupted run can be resumed where it stopped. Nothing is
//! rolled back.

use chrono::{Datelike, Months, NaiveDate, Utc};
use scholaris_core::{is_known_grade, next_grade, ClassId, RunId, SessionId};
use scholaris_store::{
    Class, PromotionStatus, RolloverCounts, RolloverRun, RolloverStatus, RolloverStep, Session,
    SessionStatus, Store, StoreError,
};

use crate::error::{ControlError, Result};
use crate::lifecycle;
use crate::promotion::{self, PromotionEvaluator};
use crate::registry;
use crate::types::ControlConfig;

// =============================================================================
// Next-session identity
// =============================================================================

/// Derive the label of the following year.
///
/// `2025-2026` becomes `2026-2027` and `2025` becomes `2026`. Anything else
/// gets a `-next` suffix.
#[must_use]
pub fn derive_next_label(label: &str) -> String {
    if let Some((first, second)) = label.split_once('-') {
        if let (Some(a), Some(b)) = (parse_year(first), parse_year(second)) {
            return format!("{}-{}", a + 1, b + 1);
        }
    } else if let Some(year) = parse_year(label) {
        return (year + 1).to_string();
    }
    format!("{label}-next")
}

fn parse_year(s: &str) -> Option<u32> {
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Derive the date range of the session following one that ends on `end`.
///
/// The next session starts the day after and ends the day before the start's
/// anniversary. A leap-day start has no anniversary, so the session ends on
/// February 28th of the following year.
#[must_use]
pub fn derive_next_dates(end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = end.succ_opt()?;
    let anniversary = start.checked_add_months(Months::new(12))?;
    let last = if anniversary.day() == start.day() {
        anniversary.pred_opt()?
    } else {
        // Clamped to the end of a shorter month
        anniversary
    };
    Some((start, last))
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs rollover sagas against a store.
pub struct Rollover<'a, S: Store + ?Sized> {
    store: &'a S,
    evaluator: &'a dyn PromotionEvaluator,
    config: &'a ControlConfig,
}

impl<'a, S: Store + ?Sized> Rollover<'a, S> {
    /// Create an orchestrator over the given collaborators.
    #[must_use]
    pub fn new(
        store: &'a S,
        evaluator: &'a dyn PromotionEvaluator,
        config: &'a ControlConfig,
    ) -> Self {
        Self {
            store,
            evaluator,
            config,
        }
    }

    /// Start a new rollover of `source_id`.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::SessionNotFound` if the source doesn't exist,
    /// `ControlError::InvalidState` if it is archived, or
    /// `ControlError::RolloverInProgress` if another run holds the source.
    /// Errors raised by the steps are returned after the run is marked failed.
    pub fn start(&self, source_id: &SessionId) -> Result<RolloverRun> {
        let source = registry::get_session(self.store, source_id)?;
        ensure_can_roll_over(&source)?;

        let run = RolloverRun {
            run_id: RunId::generate(),
            source_session_id: source.session_id,
            source_session_name: source.name.clone(),
            target_session_id: None,
            target_session_name: None,
            status: RolloverStatus::Running,
            counts: RolloverCounts::default(),
            last_completed_step: None,
            message: None,
            started_at: Utc::now(),
            finished_at: None,
        };
        self.acquire(&run)?;

        tracing::info!(
            run_id = %run.run_id,
            source = %source.name,
            "Starting rollover"
        );

        self.drive(&source, run)
    }

    /// Continue a failed or interrupted run from its last completed step.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::RunNotFound` if the run doesn't exist,
    /// `ControlError::InvalidState` if it already completed or its source has
    /// since been archived, or `ControlError::RolloverInProgress` if another
    /// run holds the source.
    pub fn resume(&self, run_id: &RunId) -> Result<RolloverRun> {
        let mut run = self
            .store
            .get_rollover_run(run_id)?
            .ok_or(ControlError::RunNotFound(*run_id))?;
        if run.status == RolloverStatus::Completed {
            return Err(ControlError::InvalidState(format!(
                "rollover run {run_id} already completed"
            )));
        }
        let source = registry::get_session(self.store, &run.source_session_id)?;
        ensure_can_roll_over(&source)?;

        run.status = RolloverStatus::Running;
        run.message = None;
        run.finished_at = None;
        self.acquire(&run)?;

        tracing::info!(
            run_id = %run.run_id,
            source = %source.name,
            last_completed_step = ?run.last_completed_step,
            "Resuming rollover"
        );

        self.drive(&source, run)
    }

    /// Take the source lock for `run`.
    fn acquire(&self, run: &RolloverRun) -> Result<()> {
        self.store.begin_rollover(run).map_err(|e| match e {
            StoreError::Conflict(_) => ControlError::RolloverInProgress(run.source_session_id),
            other => ControlError::Store(other),
        })
    }

    /// Execute the remaining steps and record the outcome on the run.
    fn drive(&self, source: &Session, mut run: RolloverRun) -> Result<RolloverRun> {
        if let Err(e) = self.execute(source, &mut run) {
            run.status = RolloverStatus::Failed;
            run.message = Some(e.to_string());
            run.finished_at = Some(Utc::now());
            if let Err(record_err) = self.store.put_rollover_run(&run) {
                tracing::error!(
                    run_id = %run.run_id,
                    error = %record_err,
                    "Failed to record rollover failure"
                );
            }
            tracing::error!(
                run_id = %run.run_id,
                step = ?run.last_completed_step,
                error = %e,
                "Rollover failed"
            );
            return Err(e);
        }

        run.status = RolloverStatus::Completed;
        run.finished_at = Some(Utc::now());
        run.message = Some(format!(
            "Rolled over {} into {}",
            run.source_session_name,
            run.target_session_name.as_deref().unwrap_or_default()
        ));
        self.store.put_rollover_run(&run)?;

        tracing::info!(
            run_id = %run.run_id,
            classes_copied = run.counts.classes_copied,
            promoted = run.counts.promoted,
            graduated = run.counts.graduated,
            retained = run.counts.retained,
            "Rollover completed"
        );

        Ok(run)
    }

    fn execute(&self, source: &Session, run: &mut RolloverRun) -> Result<()> {
        for step in RolloverStep::remaining_after(run.last_completed_step) {
            match step {
                RolloverStep::CreateSession => self.create_target(source, run)?,
                RolloverStep::CopyClasses => {
                    let target = self.target(run)?;
                    self.copy_classes(source, &target, run)?;
                }
                RolloverStep::MigrateStudents => {
                    let target = self.target(run)?;
                    self.migrate_students(source, &target, run)?;
                }
                RolloverStep::DeactivateClasses => self.deactivate_classes(source)?,
            }

            run.last_completed_step = Some(step);
            self.store.put_rollover_run(run)?;
            tracing::debug!(run_id = %run.run_id, step = ?step, "Rollover step completed");
        }
        Ok(())
    }

    fn target(&self, run: &RolloverRun) -> Result<Session> {
        let target_id = run.target_session_id.ok_or_else(|| {
            ControlError::Internal(format!("rollover run {} has no target session", run.run_id))
        })?;
        registry::get_session(self.store, &target_id)
    }

    /// Create the next session, or reuse the one this run already planned.
    ///
    /// The target id is recorded on the run before the session is written, so
    /// a retry finds and reuses it instead of creating a second one. A name
    /// collision fails before anything is recorded.
    fn create_target(&self, source: &Session, run: &mut RolloverRun) -> Result<()> {
        let name = derive_next_label(&source.name);

        if let Some(id) = run.target_session_id {
            if self.store.get_session(&id)?.is_some() {
                tracing::debug!(session_id = %id, "Reusing rollover target session");
                return Ok(());
            }
        }
        if self.store.get_session_by_name(&name)?.is_some() {
            return Err(ControlError::SessionNameTaken(name));
        }

        let target_id = if let Some(id) = run.target_session_id {
            id
        } else {
            let id = SessionId::generate();
            run.target_session_id = Some(id);
            run.target_session_name = Some(name.clone());
            self.store.put_rollover_run(run)?;
            id
        };

        let (start_date, end_date) = derive_next_dates(source.end_date).ok_or_else(|| {
            ControlError::Internal(format!("cannot derive dates after {}", source.end_date))
        })?;

        let now = Utc::now();
        let target = Session {
            session_id: target_id,
            name,
            academic_year: derive_next_label(&source.academic_year),
            start_date,
            end_date,
            description: Some(format!("Rolled over from {}", source.name)),
            status: SessionStatus::Active,
            is_current: true,
            promotion_criteria: source.promotion_criteria.clone(),
            archived_data: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            archived_at: None,
        };
        registry::insert_session(self.store, &target)?;

        tracing::info!(
            session_id = %target.session_id,
            name = %target.name,
            "Created rollover target session"
        );
        Ok(())
    }

    fn copy_classes(&self, source: &Session, target: &Session, run: &mut RolloverRun) -> Result<()> {
        let now = Utc::now();

        for class in self.store.list_classes_by_session(&source.session_id)? {
            let copy = Class {
                class_id: ClassId::generate(),
                name: class.name,
                section: class.section,
                academic_year: target.academic_year.clone(),
                session_id: target.session_id,
                session_name: target.name.clone(),
                capacity: class.capacity,
                current_strength: 0,
                is_active_session: true,
                session_end_date: None,
                class_teacher: class.class_teacher,
                created_at: now,
            };
            if !self.store.insert_class_if_absent(&copy)? {
                tracing::debug!(
                    class = %copy.name,
                    section = %copy.section,
                    "Class already present in target session"
                );
            }
        }

        let copied = self.store.list_classes_by_session(&target.session_id)?.len();
        run.counts.classes_copied = u32::try_from(copied).unwrap_or(u32::MAX);
        Ok(())
    }

    fn migrate_students(
        &self,
        source: &Session,
        target: &Session,
        run: &mut RolloverRun,
    ) -> Result<()> {
        for mut student in promotion::active_students(self.store, &source.session_id)? {
            if student.last_rollover_run == Some(run.run_id) {
                continue;
            }

            let verdict = self.evaluator.evaluate(&student, source)?;
            let now = Utc::now();
            let previous_counts = run.counts;

            if verdict.eligible {
                if !is_known_grade(&student.grade) {
                    tracing::warn!(
                        student_id = %student.student_id,
                        grade = %student.grade,
                        "Grade is not on the ladder, graduating student"
                    );
                }
                let target_grade = next_grade(&student.grade);
                let graduated = promotion::advance(
                    &mut student,
                    target_grade,
                    None,
                    &self.config.rollover_notes,
                    &self.config.default_section,
                    now,
                );
                run.counts.promoted += 1;
                if graduated {
                    run.counts.graduated += 1;
                } else {
                    student.current_session = Some(target.session_id);
                }
            } else {
                student.promotion_status = PromotionStatus::Retained;
                student.promotion_notes = Some(self.config.retained_notes.clone());
                student.updated_at = now;
                run.counts.retained += 1;
            }
            student.last_rollover_run = Some(run.run_id);

            // Counters only move forward together with the student write
            if let Err(e) = self.store.commit_student_migration(&student, run) {
                run.counts = previous_counts;
                return Err(e.into());
            }
            tracing::debug!(
                student_id = %student.student_id,
                status = ?student.promotion_status,
                "Migrated student"
            );
        }
        Ok(())
    }

    fn deactivate_classes(&self, source: &Session) -> Result<()> {
        let now = Utc::now();
        for mut class in self.store.list_classes_by_session(&source.session_id)? {
            if class.is_active_session {
                class.is_active_session = false;
                class.session_end_date = Some(now);
                self.store.put_class(&class)?;
            }
        }
        Ok(())
    }
}

fn ensure_can_roll_over(source: &Session) -> Result<()> {
    if lifecycle::can_roll_over(source.status) {
        Ok(())
    } else {
        Err(ControlError::InvalidState(format!(
            "session {} is archived and cannot be rolled over",
            source.name
        )))
    }
}

/// List the runs recorded for a source session, newest first.
///
/// # Errors
///
/// Returns `ControlError::SessionNotFound` if the session doesn't exist.
pub fn list_rollover_runs<S: Store + ?Sized>(
    store: &S,
    session_id: &SessionId,
) -> Result<Vec<RolloverRun>> {
    registry::get_session(store, session_id)?;
    Ok(store.list_rollover_runs(session_id)?)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::promotion::AttendanceEvaluator;
    use crate::testing::{date, open_store, seed_attendance, seed_class, seed_session, seed_student};
    use scholaris_core::StudentId;
    use scholaris_store::{Attendance, RocksStore, Student};
    use tempfile::TempDir;

    #[test]
    fn next_label_year_range() {
        assert_eq!(derive_next_label("2025-2026"), "2026-2027");
        assert_eq!(derive_next_label("1999-2000"), "2000-2001");
    }

    #[test]
    fn next_label_single_year() {
        assert_eq!(derive_next_label("2025"), "2026");
    }

    #[test]
    fn next_label_fallback() {
        assert_eq!(derive_next_label("Spring Term"), "Spring Term-next");
        assert_eq!(derive_next_label("25-26"), "25-26-next");
        assert_eq!(derive_next_label("2025-26"), "2025-26-next");
    }

    #[test]
    fn next_dates() {
        let (start, end) = derive_next_dates(date(2026, 3, 31)).unwrap();
        assert_eq!(start, date(2026, 4, 1));
        assert_eq!(end, date(2027, 3, 31));

        // A leap-day start ends on February 28th
        let (start, end) = derive_next_dates(date(2024, 2, 28)).unwrap();
        assert_eq!(start, date(2024, 2, 29));
        assert_eq!(end, date(2025, 2, 28));

        // A March start spanning a leap year keeps the 29th
        let (start, end) = derive_next_dates(date(2023, 2, 28)).unwrap();
        assert_eq!(start, date(2023, 3, 1));
        assert_eq!(end, date(2024, 2, 29));
    }

    fn run_once(store: &Arc<RocksStore>, source: &SessionId) -> Result<RolloverRun> {
        let evaluator = AttendanceEvaluator::new(Arc::clone(store));
        let config = ControlConfig::default();
        Rollover::new(&**store, &evaluator, &config).start(source)
    }

    #[test]
    fn rollover_promotes_and_retains() {
        let (store, _dir) = open_store();
        let source = seed_session(&store, "2025-2026", SessionStatus::Active);
        seed_class(&store, &source, "10", "B");
        seed_class(&store, &source, "11", "A");
        let good = seed_student(&store, &source, "10", "B");
        let poor = seed_student(&store, &source, "10", "B");
        let senior = seed_student(&store, &source, "12", "A");
        seed_attendance(&store, &good, &source, 8, 10);
        seed_attendance(&store, &poor, &source, 5, 10);
        seed_attendance(&store, &senior, &source, 10, 10);

        let run = run_once(&store, &source.session_id).unwrap();

        assert_eq!(run.status, RolloverStatus::Completed);
        assert_eq!(run.last_completed_step, Some(RolloverStep::DeactivateClasses));
        assert_eq!(
            run.counts,
            RolloverCounts {
                classes_copied: 2,
                promoted: 2,
                graduated: 1,
                retained: 1,
            }
        );
        assert!(store.running_rollover(&source.session_id).unwrap().is_none());

        let target = store.get_session_by_name("2026-2027").unwrap().unwrap();
        assert_eq!(target.academic_year, "2026-2027");
        assert_eq!(target.start_date, date(2026, 4, 1));
        assert_eq!(target.end_date, date(2027, 3, 31));
        assert_eq!(run.target_session_id, Some(target.session_id));
        assert_eq!(store.current_session().unwrap().unwrap().session_id, target.session_id);
        assert!(!store.get_session(&source.session_id).unwrap().unwrap().is_current);

        let good = store.get_student(&good.student_id).unwrap().unwrap();
        assert_eq!(good.grade, "11");
        assert_eq!(good.section, "B");
        assert_eq!(good.current_session, Some(target.session_id));
        assert_eq!(good.promotion_status, PromotionStatus::Promoted);
        assert_eq!(good.promotion_notes.as_deref(), Some("Auto rollover"));
        assert_eq!(good.previous_grade.as_deref(), Some("10"));

        let poor = store.get_student(&poor.student_id).unwrap().unwrap();
        assert_eq!(poor.grade, "10");
        assert_eq!(poor.current_session, Some(source.session_id));
        assert_eq!(poor.promotion_status, PromotionStatus::Retained);
        assert_eq!(poor.promotion_notes.as_deref(), Some("Below attendance criteria"));

        let senior = store.get_student(&senior.student_id).unwrap().unwrap();
        assert_eq!(senior.promotion_status, PromotionStatus::Graduated);
        assert!(senior.current_session.is_none());

        let copies = store.list_classes_by_session(&target.session_id).unwrap();
        assert_eq!(copies.len(), 2);
        assert!(copies.iter().all(|c| c.is_active_session && c.current_strength == 0));
        let originals = store.list_classes_by_session(&source.session_id).unwrap();
        assert!(originals
            .iter()
            .all(|c| !c.is_active_session && c.session_end_date.is_some()));
    }

    #[test]
    fn rollover_skips_deleted_students() {
        let (store, _dir) = open_store();
        let source = seed_session(&store, "2025-2026", SessionStatus::Active);
        let mut gone = seed_student(&store, &source, "3", "A");
        gone.deleted = true;
        store.put_student(&gone).unwrap();

        let run = run_once(&store, &source.session_id).unwrap();
        assert_eq!(run.counts.promoted + run.counts.retained, 0);
        assert_eq!(store.get_student(&gone.student_id).unwrap().unwrap().grade, "3");
    }

    #[test]
    fn rollover_refuses_archived_source() {
        let (store, _dir) = open_store();
        let source = seed_session(&store, "2025-2026", SessionStatus::Archived);

        let result = run_once(&store, &source.session_id);
        assert!(matches!(result, Err(ControlError::InvalidState(_))));
        assert!(store.list_rollover_runs(&source.session_id).unwrap().is_empty());
    }

    #[test]
    fn rollover_conflicts_with_running_run() {
        let (store, _dir) = open_store();
        let source = seed_session(&store, "2025-2026", SessionStatus::Active);
        let held = RolloverRun {
            run_id: RunId::generate(),
            source_session_id: source.session_id,
            source_session_name: source.name.clone(),
            target_session_id: None,
            target_session_name: None,
            status: RolloverStatus::Running,
            counts: RolloverCounts::default(),
            last_completed_step: None,
            message: None,
            started_at: Utc::now(),
            finished_at: None,
        };
        store.begin_rollover(&held).unwrap();

        let result = run_once(&store, &source.session_id);
        assert!(matches!(result, Err(ControlError::RolloverInProgress(_))));
        assert_eq!(store.list_sessions().unwrap().len(), 1);
    }

    #[test]
    fn rollover_fails_when_target_name_is_taken() {
        let (store, _dir) = open_store();
        let source = seed_session(&store, "2025-2026", SessionStatus::Active);
        seed_session(&store, "2026-2027", SessionStatus::Completed);

        let result = run_once(&store, &source.session_id);
        assert!(matches!(result, Err(ControlError::SessionNameTaken(_))));

        let runs = store.list_rollover_runs(&source.session_id).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RolloverStatus::Failed);
        assert!(runs[0].message.is_some());
        assert!(runs[0].target_session_id.is_none());
        assert!(runs[0].target_session_name.is_none());
        assert!(store.running_rollover(&source.session_id).unwrap().is_none());
    }

    #[test]
    fn copying_classes_twice_does_not_duplicate() {
        let (store, _dir) = open_store();
        let source = seed_session(&store, "2025-2026", SessionStatus::Active);
        let target = seed_session(&store, "2026-2027", SessionStatus::Active);
        seed_class(&store, &source, "1", "A");
        seed_class(&store, &source, "2", "A");
        let evaluator = AttendanceEvaluator::new(Arc::clone(&store));
        let config = ControlConfig::default();
        let rollover = Rollover::new(&*store, &evaluator, &config);
        let mut run = RolloverRun {
            run_id: RunId::generate(),
            source_session_id: source.session_id,
            source_session_name: source.name.clone(),
            target_session_id: Some(target.session_id),
            target_session_name: Some(target.name.clone()),
            status: RolloverStatus::Running,
            counts: RolloverCounts::default(),
            last_completed_step: None,
            message: None,
            started_at: Utc::now(),
            finished_at: None,
        };

        rollover.copy_classes(&source, &target, &mut run).unwrap();
        rollover.copy_classes(&source, &target, &mut run).unwrap();

        assert_eq!(store.list_classes_by_session(&target.session_id).unwrap().len(), 2);
        assert_eq!(run.counts.classes_copied, 2);
    }

    // =========================================================================
    // Failure and resume
    // =========================================================================

    /// Store wrapper that fails student migrations while armed.
    struct FlakyStore {
        inner: RocksStore,
        fail_migrations: AtomicBool,
    }

    impl FlakyStore {
        fn open(dir: &TempDir) -> Self {
            Self {
                inner: RocksStore::open(dir.path()).unwrap(),
                fail_migrations: AtomicBool::new(false),
            }
        }
    }

    impl Store for FlakyStore {
        fn create_session(&self, session: &Session) -> scholaris_store::Result<()> {
            self.inner.create_session(session)
        }
        fn put_session(&self, session: &Session) -> scholaris_store::Result<()> {
            self.inner.put_session(session)
        }
        fn get_session(&self, id: &SessionId) -> scholaris_store::Result<Option<Session>> {
            self.inner.get_session(id)
        }
        fn get_session_by_name(&self, name: &str) -> scholaris_store::Result<Option<Session>> {
            self.inner.get_session_by_name(name)
        }
        fn list_sessions(&self) -> scholaris_store::Result<Vec<Session>> {
            self.inner.list_sessions()
        }
        fn current_session(&self) -> scholaris_store::Result<Option<Session>> {
            self.inner.current_session()
        }
        fn put_class(&self, class: &Class) -> scholaris_store::Result<()> {
            self.inner.put_class(class)
        }
        fn insert_class_if_absent(&self, class: &Class) -> scholaris_store::Result<bool> {
            self.inner.insert_class_if_absent(class)
        }
        fn get_class(&self, id: &ClassId) -> scholaris_store::Result<Option<Class>> {
            self.inner.get_class(id)
        }
        fn list_classes_by_session(&self, id: &SessionId) -> scholaris_store::Result<Vec<Class>> {
            self.inner.list_classes_by_session(id)
        }
        fn put_student(&self, student: &Student) -> scholaris_store::Result<()> {
            self.inner.put_student(student)
        }
        fn get_student(&self, id: &StudentId) -> scholaris_store::Result<Option<Student>> {
            self.inner.get_student(id)
        }
        fn list_students_by_session(
            &self,
            id: &SessionId,
        ) -> scholaris_store::Result<Vec<Student>> {
            self.inner.list_students_by_session(id)
        }
        fn insert_attendance(&self, attendance: &Attendance) -> scholaris_store::Result<()> {
            self.inner.insert_attendance(attendance)
        }
        fn list_attendance(
            &self,
            student_id: &StudentId,
            session_id: &SessionId,
        ) -> scholaris_store::Result<Vec<Attendance>> {
            self.inner.list_attendance(student_id, session_id)
        }
        fn begin_rollover(&self, run: &RolloverRun) -> scholaris_store::Result<()> {
            self.inner.begin_rollover(run)
        }
        fn put_rollover_run(&self, run: &RolloverRun) -> scholaris_store::Result<()> {
            self.inner.put_rollover_run(run)
        }
        fn commit_student_migration(
            &self,
            student: &Student,
            run: &RolloverRun,
        ) -> scholaris_store::Result<()> {
            if self.fail_migrations.load(Ordering::SeqCst) {
                return Err(StoreError::Database("disk unavailable".into()));
            }
            self.inner.commit_student_migration(student, run)
        }
        fn get_rollover_run(&self, id: &RunId) -> scholaris_store::Result<Option<RolloverRun>> {
            self.inner.get_rollover_run(id)
        }
        fn running_rollover(
            &self,
            id: &SessionId,
        ) -> scholaris_store::Result<Option<RolloverRun>> {
            self.inner.running_rollover(id)
        }
        fn list_rollover_runs(&self, id: &SessionId) -> scholaris_store::Result<Vec<RolloverRun>> {
            self.inner.list_rollover_runs(id)
        }
    }

    #[test]
    fn failed_rollover_resumes_to_completion() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FlakyStore::open(&dir));
        let source = seed_session(&store.inner, "2025-2026", SessionStatus::Active);
        seed_class(&store.inner, &source, "4", "A");
        let student = seed_student(&store.inner, &source, "4", "A");
        seed_attendance(&store.inner, &student, &source, 9, 10);

        let evaluator = AttendanceEvaluator::new(Arc::clone(&store));
        let config = ControlConfig::default();
        let rollover = Rollover::new(&*store, &evaluator, &config);

        store.fail_migrations.store(true, Ordering::SeqCst);
        let err = rollover.start(&source.session_id).unwrap_err();
        assert!(matches!(err, ControlError::Store(StoreError::Database(_))));

        let failed = store.list_rollover_runs(&source.session_id).unwrap().remove(0);
        assert_eq!(failed.status, RolloverStatus::Failed);
        assert_eq!(failed.last_completed_step, Some(RolloverStep::CopyClasses));
        assert!(failed.message.unwrap().contains("disk unavailable"));
        assert!(failed.finished_at.is_some());
        assert!(store.running_rollover(&source.session_id).unwrap().is_none());

        store.fail_migrations.store(false, Ordering::SeqCst);
        let resumed = rollover.resume(&failed.run_id).unwrap();

        assert_eq!(resumed.run_id, failed.run_id);
        assert_eq!(resumed.started_at, failed.started_at);
        assert_eq!(resumed.status, RolloverStatus::Completed);
        assert_eq!(resumed.counts.promoted, 1);
        assert_eq!(resumed.counts.classes_copied, 1);

        // Only one target session was ever created
        assert_eq!(store.list_sessions().unwrap().len(), 2);
        let student = store.get_student(&student.student_id).unwrap().unwrap();
        assert_eq!(student.grade, "5");
        assert_eq!(student.current_session, resumed.target_session_id);

        let again = rollover.resume(&failed.run_id);
        assert!(matches!(again, Err(ControlError::InvalidState(_))));
    }

    #[test]
    fn resume_refuses_archived_source() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FlakyStore::open(&dir));
        let source = seed_session(&store.inner, "2025-2026", SessionStatus::Active);
        seed_class(&store.inner, &source, "4", "A");
        let student = seed_student(&store.inner, &source, "4", "A");
        seed_attendance(&store.inner, &student, &source, 9, 10);

        let evaluator = AttendanceEvaluator::new(Arc::clone(&store));
        let config = ControlConfig::default();
        let rollover = Rollover::new(&*store, &evaluator, &config);

        store.fail_migrations.store(true, Ordering::SeqCst);
        rollover.start(&source.session_id).unwrap_err();
        store.fail_migrations.store(false, Ordering::SeqCst);
        let failed = store.list_rollover_runs(&source.session_id).unwrap().remove(0);

        registry::complete_session(&*store, &evaluator, &config, &source.session_id, false)
            .unwrap();
        registry::archive_session(&*store, &source.session_id).unwrap();

        let result = rollover.resume(&failed.run_id);
        assert!(matches!(result, Err(ControlError::InvalidState(_))));

        let run = store.get_rollover_run(&failed.run_id).unwrap().unwrap();
        assert_eq!(run.status, RolloverStatus::Failed);
        assert!(store.running_rollover(&source.session_id).unwrap().is_none());

        let student = store.get_student(&student.student_id).unwrap().unwrap();
        assert_eq!(student.grade, "4");
        assert_eq!(student.current_session, Some(source.session_id));
        assert!(store
            .list_classes_by_session(&source.session_id)
            .unwrap()
            .iter()
            .all(|c| c.is_active_session));
    }

    #[test]
    fn rollover_graduates_unknown_grade() {
        let (store, _dir) = open_store();
        let source = seed_session(&store, "2025-2026", SessionStatus::Active);
        let student = seed_student(&store, &source, "pre-k", "A");
        seed_attendance(&store, &student, &source, 10, 10);

        let run = run_once(&store, &source.session_id).unwrap();
        assert_eq!(run.counts.graduated, 1);

        let student = store.get_student(&student.student_id).unwrap().unwrap();
        assert_eq!(student.promotion_status, PromotionStatus::Graduated);
        assert_eq!(student.previous_grade.as_deref(), Some("pre-k"));
    }

    #[test]
    fn resume_unknown_run() {
        let (store, _dir) = open_store();
        let evaluator = AttendanceEvaluator::new(Arc::clone(&store));
        let config = ControlConfig::default();

        let result = Rollover::new(&*store, &evaluator, &config).resume(&RunId::generate());
        assert!(matches!(result, Err(ControlError::RunNotFound(_))));
    }

    #[test]
    fn list_runs_requires_session() {
        let (store, _dir) = open_store();
        assert!(matches!(
            list_rollover_runs(&*store, &SessionId::generate()),
            Err(ControlError::SessionNotFound(_))
        ));
    }
}
