//! Control service implementation.
//!
//! This module provides the `AcademicControl` trait and `ControlService`
//! implementation that coordinates sessions, promotions, attendance and
//! rollovers.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use scholaris_core::{RunId, SessionId, StudentId};
use scholaris_store::{Attendance, RolloverRun, Session, Store, Student};

use crate::attendance;
use crate::bulk::BulkOutcome;
use crate::error::{ControlError, Result};
use crate::promotion::{self, AttendanceEvaluator, PromotionEvaluator};
use crate::registry;
use crate::rollover::{self, Rollover};
use crate::types::{
    AttendanceReport, BulkPromoteRequest, CompletionReport, ControlConfig, CreateSessionRequest,
    MarkAttendanceRequest, PromoteRequest, PromotionReport, PromotionStatusReport,
    SessionAnalytics,
};

/// Trait defining the control operations.
///
/// This trait provides the complete API used by the gateway. Implementations
/// handle persistence, validation and coordination.
#[async_trait]
pub trait AcademicControl: Send + Sync {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Start a new session and make it current.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::SessionNameTaken` if the name is already used.
    async fn start_session(&self, request: CreateSessionRequest) -> Result<Session>;

    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::SessionNotFound` if the session doesn't exist.
    async fn get_session(&self, session_id: &SessionId) -> Result<Session>;

    /// List all sessions, newest first.
    async fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Get the current session.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::NoCurrentSession` if no session is current.
    async fn current_session(&self) -> Result<Session>;

    /// Complete a session, optionally promoting its eligible students.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::InvalidTransition` if the session is not active.
    async fn complete_session(
        &self,
        session_id: &SessionId,
        auto_promote: bool,
    ) -> Result<CompletionReport>;

    /// Archive a completed session.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::InvalidTransition` if the session is not completed.
    async fn archive_session(&self, session_id: &SessionId) -> Result<Session>;

    /// Aggregate figures for a session.
    async fn session_analytics(&self, session_id: &SessionId) -> Result<SessionAnalytics>;

    // =========================================================================
    // Rollover Operations
    // =========================================================================

    /// Roll a session over into the next one.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::RolloverInProgress` if a run already holds the
    /// source session.
    async fn auto_rollover(&self, session_id: &SessionId) -> Result<RolloverRun>;

    /// Resume a failed or interrupted rollover run.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::RolloverInProgress` if the run is executing in
    /// this process, or `ControlError::InvalidState` if it already completed.
    async fn resume_rollover(&self, run_id: &RunId) -> Result<RolloverRun>;

    /// List the rollover runs of a source session, newest first.
    async fn list_rollover_runs(&self, session_id: &SessionId) -> Result<Vec<RolloverRun>>;

    // =========================================================================
    // Promotion Operations
    // =========================================================================

    /// Evaluate every student of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::InvalidState` if the session is not completed.
    async fn evaluate_promotions(
        &self,
        session_id: &SessionId,
        auto_promote: bool,
    ) -> Result<PromotionReport>;

    /// Promote one eligible student.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::NotEligible` if the student doesn't meet the criteria.
    async fn promote_student(
        &self,
        student_id: &StudentId,
        request: PromoteRequest,
    ) -> Result<Student>;

    /// Promote an explicit list of students, collecting per-student errors.
    async fn bulk_promote(&self, request: BulkPromoteRequest) -> Result<BulkOutcome<Student>>;

    /// Promotion progress of a session.
    async fn promotion_status(&self, session_id: &SessionId) -> Result<PromotionStatusReport>;

    // =========================================================================
    // Attendance Operations
    // =========================================================================

    /// Mark one day of attendance for many students.
    async fn mark_attendance(
        &self,
        request: MarkAttendanceRequest,
    ) -> Result<BulkOutcome<Attendance>>;

    /// A student's attendance in a session.
    async fn attendance_summary(
        &self,
        student_id: &StudentId,
        session_id: &SessionId,
    ) -> Result<AttendanceReport>;

    // =========================================================================
    // Health
    // =========================================================================

    /// Check that the store can be read.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Store` if the read fails.
    async fn health_check(&self) -> Result<()>;
}

/// The main control service implementation.
pub struct ControlService<S: Store> {
    store: Arc<S>,
    config: ControlConfig,
    evaluator: Arc<dyn PromotionEvaluator>,
    in_flight: Mutex<HashSet<SessionId>>,
}

impl<S: Store + 'static> ControlService<S> {
    /// Create a new control service evaluating promotions from attendance.
    #[must_use]
    pub fn new(store: Arc<S>, config: ControlConfig) -> Self {
        let evaluator = Arc::new(AttendanceEvaluator::new(Arc::clone(&store)));
        Self::with_evaluator(store, config, evaluator)
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, ControlConfig::default())
    }
}

impl<S: Store> ControlService<S> {
    /// Create a control service with a custom promotion evaluator.
    #[must_use]
    pub fn with_evaluator(
        store: Arc<S>,
        config: ControlConfig,
        evaluator: Arc<dyn PromotionEvaluator>,
    ) -> Self {
        Self {
            store,
            config,
            evaluator,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ControlConfig {
        &self.config
    }

    fn rollover(&self) -> Rollover<'_, S> {
        Rollover::new(&*self.store, &*self.evaluator, &self.config)
    }

    /// Mark a source session as being rolled over by this process.
    fn claim(&self, session_id: SessionId) -> Result<InFlight<'_>> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(session_id) {
            return Err(ControlError::RolloverInProgress(session_id));
        }
        Ok(InFlight {
            set: &self.in_flight,
            session_id,
        })
    }
}

/// Releases an in-flight claim on drop.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<SessionId>>,
    session_id: SessionId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.session_id);
    }
}

#[async_trait]
impl<S: Store + 'static> AcademicControl for ControlService<S> {
    // =========================================================================
    // Session Operations
    // =========================================================================

    async fn start_session(&self, request: CreateSessionRequest) -> Result<Session> {
        registry::create_session(&*self.store, &self.config, request)
    }

    async fn get_session(&self, session_id: &SessionId) -> Result<Session> {
        registry::get_session(&*self.store, session_id)
    }

    async fn list_sessions(&self) -> Result<Vec<Session>> {
        registry::list_sessions(&*self.store)
    }

    async fn current_session(&self) -> Result<Session> {
        registry::current_session(&*self.store)
    }

    async fn complete_session(
        &self,
        session_id: &SessionId,
        auto_promote: bool,
    ) -> Result<CompletionReport> {
        registry::complete_session(
            &*self.store,
            &*self.evaluator,
            &self.config,
            session_id,
            auto_promote,
        )
    }

    async fn archive_session(&self, session_id: &SessionId) -> Result<Session> {
        registry::archive_session(&*self.store, session_id)
    }

    async fn session_analytics(&self, session_id: &SessionId) -> Result<SessionAnalytics> {
        registry::session_analytics(&*self.store, session_id)
    }

    // =========================================================================
    // Rollover Operations
    // =========================================================================

    async fn auto_rollover(&self, session_id: &SessionId) -> Result<RolloverRun> {
        let _claim = self.claim(*session_id)?;
        self.rollover().start(session_id)
    }

    async fn resume_rollover(&self, run_id: &RunId) -> Result<RolloverRun> {
        let run = self
            .store
            .get_rollover_run(run_id)?
            .ok_or(ControlError::RunNotFound(*run_id))?;

        let _claim = self.claim(run.source_session_id)?;
        self.rollover().resume(run_id)
    }

    async fn list_rollover_runs(&self, session_id: &SessionId) -> Result<Vec<RolloverRun>> {
        rollover::list_rollover_runs(&*self.store, session_id)
    }

    // =========================================================================
    // Promotion Operations
    // =========================================================================

    async fn evaluate_promotions(
        &self,
        session_id: &SessionId,
        auto_promote: bool,
    ) -> Result<PromotionReport> {
        promotion::evaluate_promotions(
            &*self.store,
            &*self.evaluator,
            &self.config,
            session_id,
            auto_promote,
        )
    }

    async fn promote_student(
        &self,
        student_id: &StudentId,
        request: PromoteRequest,
    ) -> Result<Student> {
        promotion::promote_student(
            &*self.store,
            &*self.evaluator,
            &self.config,
            student_id,
            request,
        )
    }

    async fn bulk_promote(&self, request: BulkPromoteRequest) -> Result<BulkOutcome<Student>> {
        promotion::bulk_promote(&*self.store, &self.config, request)
    }

    async fn promotion_status(&self, session_id: &SessionId) -> Result<PromotionStatusReport> {
        promotion::promotion_status(&*self.store, session_id)
    }

    // =========================================================================
    // Attendance Operations
    // =========================================================================

    async fn mark_attendance(
        &self,
        request: MarkAttendanceRequest,
    ) -> Result<BulkOutcome<Attendance>> {
        attendance::mark_attendance(&*self.store, request)
    }

    async fn attendance_summary(
        &self,
        student_id: &StudentId,
        session_id: &SessionId,
    ) -> Result<AttendanceReport> {
        attendance::attendance_report(&*self.store, student_id, session_id)
    }

    // =========================================================================
    // Health
    // =========================================================================

    async fn health_check(&self) -> Result<()> {
        self.store.current_session()?;
        Ok(())
    }
}
