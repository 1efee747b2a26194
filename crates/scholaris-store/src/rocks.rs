//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//!
//! Every write that has to read before it writes (uniqueness checks, the
//! current-session pointer, the rollover lock, index moves) runs under a
//! single store-wide mutex and lands as one `WriteBatch`, so readers never
//! observe a half-applied change and two writers cannot interleave their
//! check and their write.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use scholaris_core::{ClassId, RunId, SessionId, StudentId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::{Attendance, Class, RolloverRun, RolloverStatus, Session, Student};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read a raw value.
    fn get_raw(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Read and decode a record.
    fn get_record<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        self.get_raw(cf_name, key)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Collect every `(key, value)` pair whose key starts with `prefix`.
    fn scan_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            // Stop if we're past the prefix
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Stage moving the current-session pointer to `session_id`, clearing the
    /// flag on whichever session held it before.
    fn stage_current_switch(&self, batch: &mut WriteBatch, session_id: &SessionId) -> Result<()> {
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_current = self.cf(cf::CURRENT_SESSION)?;

        let previous = self
            .get_raw(cf::CURRENT_SESSION, keys::CURRENT_SESSION_KEY)?
            .and_then(|v| keys::decode_id(&v))
            .map(SessionId::from_bytes);

        if let Some(previous_id) = previous.filter(|id| id != session_id) {
            if let Some(mut previous) = self.get_session(&previous_id)? {
                previous.is_current = false;
                previous.updated_at = Utc::now();
                batch.put_cf(&cf_sessions, previous_id.as_bytes(), Self::serialize(&previous)?);
                tracing::debug!(session_id = %previous_id, "Cleared current session flag");
            }
        }

        batch.put_cf(&cf_current, keys::CURRENT_SESSION_KEY, session_id.as_bytes());
        Ok(())
    }

    /// Stage a student write, moving the session index entry if needed.
    fn stage_student(&self, batch: &mut WriteBatch, student: &Student) -> Result<()> {
        let cf_students = self.cf(cf::STUDENTS)?;
        let cf_by_session = self.cf(cf::STUDENTS_BY_SESSION)?;

        let old_session = self
            .get_student(&student.student_id)?
            .and_then(|s| s.current_session);

        if let Some(old) = old_session {
            if student.current_session != Some(old) {
                batch.delete_cf(
                    &cf_by_session,
                    keys::session_student_key(&old, &student.student_id),
                );
            }
        }
        if let Some(session_id) = student.current_session {
            batch.put_cf(
                &cf_by_session,
                keys::session_student_key(&session_id, &student.student_id),
                [],
            );
        }

        batch.put_cf(
            &cf_students,
            student.student_id.as_bytes(),
            Self::serialize(student)?,
        );
        Ok(())
    }

    /// Stage a class record together with its session index and slot.
    fn stage_class(&self, batch: &mut WriteBatch, class: &Class) -> Result<()> {
        let cf_classes = self.cf(cf::CLASSES)?;
        let cf_by_session = self.cf(cf::CLASSES_BY_SESSION)?;
        let cf_slots = self.cf(cf::CLASS_SLOTS)?;

        batch.put_cf(&cf_classes, class.class_id.as_bytes(), Self::serialize(class)?);
        batch.put_cf(
            &cf_by_session,
            keys::session_class_key(&class.session_id, &class.class_id),
            [],
        );
        batch.put_cf(
            &cf_slots,
            keys::class_slot_key(&class.session_id, &class.name, &class.section),
            class.class_id.as_bytes(),
        );
        Ok(())
    }

    /// Stage a run write; a run that is no longer running drops its lock.
    fn stage_run(&self, batch: &mut WriteBatch, run: &RolloverRun) -> Result<()> {
        let cf_runs = self.cf(cf::ROLLOVER_RUNS)?;
        let cf_by_source = self.cf(cf::ROLLOVER_RUNS_BY_SOURCE)?;
        let cf_locks = self.cf(cf::ROLLOVER_LOCKS)?;

        batch.put_cf(&cf_runs, run.run_id.as_bytes(), Self::serialize(run)?);
        batch.put_cf(
            &cf_by_source,
            keys::source_run_key(&run.source_session_id, &run.run_id),
            [],
        );

        if run.status != RolloverStatus::Running {
            let holder = self.get_raw(cf::ROLLOVER_LOCKS, run.source_session_id.as_bytes())?;
            if holder.as_deref() == Some(run.run_id.as_bytes().as_slice()) {
                batch.delete_cf(&cf_locks, run.source_session_id.as_bytes());
            }
        }
        Ok(())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    fn create_session(&self, session: &Session) -> Result<()> {
        let _guard = self.write_lock.lock();
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_name = self.cf(cf::SESSIONS_BY_NAME)?;

        let name_key = keys::session_name_key(&session.name);
        if self.get_raw(cf::SESSIONS_BY_NAME, &name_key)?.is_some() {
            return Err(StoreError::Conflict(format!(
                "session name already exists: {}",
                session.name
            )));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_sessions,
            session.session_id.as_bytes(),
            Self::serialize(session)?,
        );
        batch.put_cf(&cf_by_name, &name_key, session.session_id.as_bytes());
        if session.is_current {
            self.stage_current_switch(&mut batch, &session.session_id)?;
        }

        self.write(batch)
    }

    fn put_session(&self, session: &Session) -> Result<()> {
        let _guard = self.write_lock.lock();
        let cf_sessions = self.cf(cf::SESSIONS)?;
        let cf_by_name = self.cf(cf::SESSIONS_BY_NAME)?;
        let cf_current = self.cf(cf::CURRENT_SESSION)?;

        let old = self
            .get_session(&session.session_id)?
            .ok_or(StoreError::NotFound)?;

        let mut batch = WriteBatch::default();

        if old.name != session.name {
            let name_key = keys::session_name_key(&session.name);
            if self.get_raw(cf::SESSIONS_BY_NAME, &name_key)?.is_some() {
                return Err(StoreError::Conflict(format!(
                    "session name already exists: {}",
                    session.name
                )));
            }
            batch.delete_cf(&cf_by_name, keys::session_name_key(&old.name));
            batch.put_cf(&cf_by_name, &name_key, session.session_id.as_bytes());
        }

        batch.put_cf(
            &cf_sessions,
            session.session_id.as_bytes(),
            Self::serialize(session)?,
        );

        if session.is_current {
            self.stage_current_switch(&mut batch, &session.session_id)?;
        } else {
            let pointer = self.get_raw(cf::CURRENT_SESSION, keys::CURRENT_SESSION_KEY)?;
            if pointer.as_deref() == Some(session.session_id.as_bytes().as_slice()) {
                batch.delete_cf(&cf_current, keys::CURRENT_SESSION_KEY);
            }
        }

        self.write(batch)
    }

    fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>> {
        self.get_record(cf::SESSIONS, session_id.as_bytes())
    }

    fn get_session_by_name(&self, name: &str) -> Result<Option<Session>> {
        let Some(id) = self
            .get_raw(cf::SESSIONS_BY_NAME, &keys::session_name_key(name))?
            .and_then(|v| keys::decode_id(&v))
        else {
            return Ok(None);
        };
        self.get_session(&SessionId::from_bytes(id))
    }

    fn list_sessions(&self) -> Result<Vec<Session>> {
        self.scan_prefix(cf::SESSIONS, &[])?
            .into_iter()
            .map(|(_, value)| Self::deserialize(&value))
            .collect()
    }

    fn current_session(&self) -> Result<Option<Session>> {
        let Some(id) = self
            .get_raw(cf::CURRENT_SESSION, keys::CURRENT_SESSION_KEY)?
            .and_then(|v| keys::decode_id(&v))
        else {
            return Ok(None);
        };
        self.get_session(&SessionId::from_bytes(id))
    }

    // =========================================================================
    // Class Operations
    // =========================================================================

    fn put_class(&self, class: &Class) -> Result<()> {
        let _guard = self.write_lock.lock();
        let cf_by_session = self.cf(cf::CLASSES_BY_SESSION)?;
        let cf_slots = self.cf(cf::CLASS_SLOTS)?;

        let slot_key = keys::class_slot_key(&class.session_id, &class.name, &class.section);
        if let Some(holder) = self.get_raw(cf::CLASS_SLOTS, &slot_key)? {
            if holder.as_slice() != class.class_id.as_bytes().as_slice() {
                return Err(StoreError::Conflict(format!(
                    "class {} section {} already exists in session {}",
                    class.name, class.section, class.session_name
                )));
            }
        }

        let mut batch = WriteBatch::default();

        // Drop the old slot and index entry if the class moved
        if let Some(old) = self.get_class(&class.class_id)? {
            let old_slot = keys::class_slot_key(&old.session_id, &old.name, &old.section);
            if old_slot != slot_key {
                batch.delete_cf(&cf_slots, old_slot);
            }
            if old.session_id != class.session_id {
                batch.delete_cf(
                    &cf_by_session,
                    keys::session_class_key(&old.session_id, &class.class_id),
                );
            }
        }

        self.stage_class(&mut batch, class)?;
        self.write(batch)
    }

    fn insert_class_if_absent(&self, class: &Class) -> Result<bool> {
        let _guard = self.write_lock.lock();

        let slot_key = keys::class_slot_key(&class.session_id, &class.name, &class.section);
        if self.get_raw(cf::CLASS_SLOTS, &slot_key)?.is_some() {
            return Ok(false);
        }

        let mut batch = WriteBatch::default();
        self.stage_class(&mut batch, class)?;
        self.write(batch)?;
        Ok(true)
    }

    fn get_class(&self, class_id: &ClassId) -> Result<Option<Class>> {
        self.get_record(cf::CLASSES, class_id.as_bytes())
    }

    fn list_classes_by_session(&self, session_id: &SessionId) -> Result<Vec<Class>> {
        let prefix = keys::session_prefix(session_id);

        let mut classes = Vec::new();
        for (key, _) in self.scan_prefix(cf::CLASSES_BY_SESSION, &prefix)? {
            let class_id = ClassId::from_bytes(keys::extract_trailing_id(&key));
            if let Some(class) = self.get_class(&class_id)? {
                classes.push(class);
            }
        }
        Ok(classes)
    }

    // =========================================================================
    // Student Operations
    // =========================================================================

    fn put_student(&self, student: &Student) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut batch = WriteBatch::default();
        self.stage_student(&mut batch, student)?;
        self.write(batch)
    }

    fn get_student(&self, student_id: &StudentId) -> Result<Option<Student>> {
        self.get_record(cf::STUDENTS, student_id.as_bytes())
    }

    fn list_students_by_session(&self, session_id: &SessionId) -> Result<Vec<Student>> {
        let prefix = keys::session_prefix(session_id);

        let mut students = Vec::new();
        for (key, _) in self.scan_prefix(cf::STUDENTS_BY_SESSION, &prefix)? {
            let student_id = StudentId::from_bytes(keys::extract_trailing_id(&key));
            if let Some(student) = self.get_student(&student_id)? {
                students.push(student);
            }
        }
        Ok(students)
    }

    // =========================================================================
    // Attendance Operations
    // =========================================================================

    fn insert_attendance(&self, attendance: &Attendance) -> Result<()> {
        let _guard = self.write_lock.lock();
        let cf_attendance = self.cf(cf::ATTENDANCE)?;

        let key = keys::attendance_key(
            &attendance.student_id,
            &attendance.session_id,
            attendance.date,
        );
        if self.get_raw(cf::ATTENDANCE, &key)?.is_some() {
            return Err(StoreError::Conflict(format!(
                "attendance already marked for student {} on {}",
                attendance.student_id, attendance.date
            )));
        }

        self.db
            .put_cf(&cf_attendance, key, Self::serialize(attendance)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list_attendance(
        &self,
        student_id: &StudentId,
        session_id: &SessionId,
    ) -> Result<Vec<Attendance>> {
        let prefix = keys::attendance_prefix(student_id, session_id);
        self.scan_prefix(cf::ATTENDANCE, &prefix)?
            .into_iter()
            .map(|(_, value)| Self::deserialize(&value))
            .collect()
    }

    // =========================================================================
    // Rollover Run Operations
    // =========================================================================

    fn begin_rollover(&self, run: &RolloverRun) -> Result<()> {
        let _guard = self.write_lock.lock();
        let cf_locks = self.cf(cf::ROLLOVER_LOCKS)?;

        if let Some(holder) = self.get_raw(cf::ROLLOVER_LOCKS, run.source_session_id.as_bytes())? {
            if holder.as_slice() != run.run_id.as_bytes().as_slice() {
                return Err(StoreError::Conflict(format!(
                    "rollover already running for session {}",
                    run.source_session_name
                )));
            }
        }

        let mut batch = WriteBatch::default();
        self.stage_run(&mut batch, run)?;
        batch.put_cf(
            &cf_locks,
            run.source_session_id.as_bytes(),
            run.run_id.as_bytes(),
        );
        self.write(batch)
    }

    fn put_rollover_run(&self, run: &RolloverRun) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut batch = WriteBatch::default();
        self.stage_run(&mut batch, run)?;
        self.write(batch)
    }

    fn commit_student_migration(&self, student: &Student, run: &RolloverRun) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut batch = WriteBatch::default();
        self.stage_student(&mut batch, student)?;
        self.stage_run(&mut batch, run)?;
        self.write(batch)
    }

    fn get_rollover_run(&self, run_id: &RunId) -> Result<Option<RolloverRun>> {
        self.get_record(cf::ROLLOVER_RUNS, run_id.as_bytes())
    }

    fn running_rollover(&self, source_session_id: &SessionId) -> Result<Option<RolloverRun>> {
        let Some(run_id) = self
            .get_raw(cf::ROLLOVER_LOCKS, source_session_id.as_bytes())?
            .and_then(|v| keys::decode_id(&v))
        else {
            return Ok(None);
        };
        self.get_rollover_run(&RunId::from_bytes(run_id))
    }

    fn list_rollover_runs(&self, source_session_id: &SessionId) -> Result<Vec<RolloverRun>> {
        let prefix = keys::session_prefix(source_session_id);

        let mut runs = Vec::new();
        for (key, _) in self.scan_prefix(cf::ROLLOVER_RUNS_BY_SOURCE, &prefix)? {
            let run_id = RunId::from_bytes(keys::extract_trailing_id(&key));
            if let Some(run) = self.get_rollover_run(&run_id)? {
                runs.push(run);
            }
        }
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }
}
