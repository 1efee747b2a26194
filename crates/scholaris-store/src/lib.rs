//! `RocksDB` storage layer for scholaris.
//!
//! This crate provides persistent storage for academic sessions, classes,
//! students, attendance and rollover runs using `RocksDB` with column families
//! for indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `sessions`, `sessions_by_name`, `current_session`: session records, the
//!   unique name index and the single current-session pointer
//! - `classes`, `classes_by_session`, `class_slots`: class records, the
//!   per-session index and the unique `(session, name, section)` slot
//! - `students`, `students_by_session`: student records indexed by their
//!   current session
//! - `attendance`: daily marks keyed by `student || session || date`
//! - `rollover_runs`, `rollover_runs_by_source`, `rollover_locks`: run audit
//!   records and the running-run lock per source session
//!
//! # Invariants
//!
//! Two invariants are enforced by the store rather than by callers:
//!
//! - At most one session is current. Setting `is_current` on one session
//!   clears it on the previous one in the same write batch.
//! - At most one rollover run is running per source session.
//!   [`Store::begin_rollover`] checks and takes the lock in one serialized
//!   operation.
//!
//! # Example
//!
//! ```no_run
//! use scholaris_store::{RocksStore, Store};
//!
//! let store = RocksStore::open("/tmp/scholaris-db").unwrap();
//! let current = store.current_session().unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;
pub use types::{
    ArchivedClass, ArchivedData, ArchivedStudent, Attendance, AttendanceStatus, Class,
    PromotionCriteria, PromotionStatus, RolloverCounts, RolloverRun, RolloverStatus, RolloverStep,
    Session, SessionStatus, Student,
};

use scholaris_core::{ClassId, RunId, SessionId, StudentId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, fault-injecting wrappers in tests).
pub trait Store: Send + Sync {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Insert a new session.
    ///
    /// If the session is current, the previous current session is cleared in
    /// the same atomic write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the name is already taken.
    fn create_session(&self, session: &Session) -> Result<()>;

    /// Update an existing session, maintaining the name index and the
    /// current-session pointer.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the session doesn't exist, or
    /// `StoreError::Conflict` if a rename collides with another session.
    fn put_session(&self, session: &Session) -> Result<()>;

    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>>;

    /// Get a session by its unique name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_session_by_name(&self, name: &str) -> Result<Option<Session>>;

    /// List all sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_sessions(&self) -> Result<Vec<Session>>;

    /// Get the current session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn current_session(&self) -> Result<Option<Session>>;

    // =========================================================================
    // Class Operations
    // =========================================================================

    /// Insert or update a class record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if another class already occupies the
    /// same `(session, name, section)` slot.
    fn put_class(&self, class: &Class) -> Result<()>;

    /// Insert a class unless its `(session, name, section)` slot is taken.
    ///
    /// Returns `true` if the class was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_class_if_absent(&self, class: &Class) -> Result<bool>;

    /// Get a class by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_class(&self, class_id: &ClassId) -> Result<Option<Class>>;

    /// List all classes of a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_classes_by_session(&self, session_id: &SessionId) -> Result<Vec<Class>>;

    // =========================================================================
    // Student Operations
    // =========================================================================

    /// Insert or update a student record.
    ///
    /// This also moves the student between session indexes when
    /// `current_session` changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_student(&self, student: &Student) -> Result<()>;

    /// Get a student by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_student(&self, student_id: &StudentId) -> Result<Option<Student>>;

    /// List all students whose current session is `session_id`, including
    /// soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_students_by_session(&self, session_id: &SessionId) -> Result<Vec<Student>>;

    // =========================================================================
    // Attendance Operations
    // =========================================================================

    /// Record an attendance mark.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the student already has a mark for
    /// that day in that session.
    fn insert_attendance(&self, attendance: &Attendance) -> Result<()>;

    /// List a student's attendance marks in a session, in date order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_attendance(
        &self,
        student_id: &StudentId,
        session_id: &SessionId,
    ) -> Result<Vec<Attendance>>;

    // =========================================================================
    // Rollover Run Operations
    // =========================================================================

    /// Persist `run` as running and take the lock for its source session.
    ///
    /// The check and the write are one serialized operation. Re-taking a lock
    /// already held by the same run succeeds, which is how a stale or failed
    /// run is resumed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if a different run holds the lock.
    fn begin_rollover(&self, run: &RolloverRun) -> Result<()>;

    /// Update a rollover run.
    ///
    /// A run that is no longer running releases its source lock in the same write.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_rollover_run(&self, run: &RolloverRun) -> Result<()>;

    /// Persist a migrated student together with the run's updated counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn commit_student_migration(&self, student: &Student, run: &RolloverRun) -> Result<()>;

    /// Get a rollover run by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_rollover_run(&self, run_id: &RunId) -> Result<Option<RolloverRun>>;

    /// Get the run currently holding the lock for a source session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn running_rollover(&self, source_session_id: &SessionId) -> Result<Option<RolloverRun>>;

    /// List every run recorded for a source session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_rollover_runs(&self, source_session_id: &SessionId) -> Result<Vec<RolloverRun>>;
}
