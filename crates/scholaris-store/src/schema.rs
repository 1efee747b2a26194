//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary session records, keyed by `session_id`.
    pub const SESSIONS: &str = "sessions";

    /// Unique index: session name to `session_id`.
    pub const SESSIONS_BY_NAME: &str = "sessions_by_name";

    /// Single-entry pointer to the current session.
    pub const CURRENT_SESSION: &str = "current_session";

    /// Primary class records, keyed by `class_id`.
    pub const CLASSES: &str = "classes";

    /// Index: classes by session, keyed by `session_id || class_id`.
    pub const CLASSES_BY_SESSION: &str = "classes_by_session";

    /// Unique index: `session_id || name || 0x00 || section` to `class_id`.
    pub const CLASS_SLOTS: &str = "class_slots";

    /// Primary student records, keyed by `student_id`.
    pub const STUDENTS: &str = "students";

    /// Index: students by current session, keyed by `session_id || student_id`.
    pub const STUDENTS_BY_SESSION: &str = "students_by_session";

    /// Attendance marks, keyed by `student_id || session_id || date`.
    pub const ATTENDANCE: &str = "attendance";

    /// Primary rollover run records, keyed by `run_id`.
    pub const ROLLOVER_RUNS: &str = "rollover_runs";

    /// Index: runs by source session, keyed by `session_id || run_id`.
    pub const ROLLOVER_RUNS_BY_SOURCE: &str = "rollover_runs_by_source";

    /// Lock table: source `session_id` to the `run_id` currently running.
    pub const ROLLOVER_LOCKS: &str = "rollover_locks";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::SESSIONS,
        cf::SESSIONS_BY_NAME,
        cf::CURRENT_SESSION,
        cf::CLASSES,
        cf::CLASSES_BY_SESSION,
        cf::CLASS_SLOTS,
        cf::STUDENTS,
        cf::STUDENTS_BY_SESSION,
        cf::ATTENDANCE,
        cf::ROLLOVER_RUNS,
        cf::ROLLOVER_RUNS_BY_SOURCE,
        cf::ROLLOVER_LOCKS,
    ]
}
