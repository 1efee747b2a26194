//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use scholaris_core::{ClassId, SessionId, StudentId};
use scholaris_store::{
    Attendance, AttendanceStatus, Class, PromotionCriteria, PromotionStatus, RocksStore, Session,
    SessionStatus, Store, Student,
};
use tempfile::TempDir;

pub fn open_store() -> (Arc<RocksStore>, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RocksStore::open(dir.path()).unwrap());
    (store, dir)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn seed_session(store: &RocksStore, name: &str, status: SessionStatus) -> Session {
    let now = Utc::now();
    let session = Session {
        session_id: SessionId::generate(),
        name: name.to_string(),
        academic_year: name.to_string(),
        start_date: date(2025, 4, 1),
        end_date: date(2026, 3, 31),
        description: None,
        status,
        is_current: status == SessionStatus::Active,
        promotion_criteria: PromotionCriteria::default(),
        archived_data: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
        archived_at: None,
    };
    store.create_session(&session).unwrap();
    session
}

pub fn seed_class(store: &RocksStore, session: &Session, name: &str, section: &str) -> Class {
    let class = Class {
        class_id: ClassId::generate(),
        name: name.to_string(),
        section: section.to_string(),
        academic_year: session.academic_year.clone(),
        session_id: session.session_id,
        session_name: session.name.clone(),
        capacity: 40,
        current_strength: 25,
        is_active_session: true,
        session_end_date: None,
        class_teacher: None,
        created_at: Utc::now(),
    };
    store.put_class(&class).unwrap();
    class
}

pub fn seed_student(store: &RocksStore, session: &Session, grade: &str, section: &str) -> Student {
    let student = Student {
        student_id: StudentId::generate(),
        name: format!("Student {grade}{section}"),
        roll_number: None,
        grade: grade.to_string(),
        section: section.to_string(),
        current_session: Some(session.session_id),
        promotion_status: PromotionStatus::Pending,
        previous_grade: None,
        previous_section: None,
        promotion_date: None,
        promotion_notes: None,
        last_rollover_run: None,
        deleted: false,
        updated_at: Utc::now(),
    };
    store.put_student(&student).unwrap();
    student
}

/// Record `present` present days out of `total`, one per day from June 1st.
pub fn seed_attendance(
    store: &RocksStore,
    student: &Student,
    session: &Session,
    present: u32,
    total: u32,
) {
    let first = date(2025, 6, 1);
    for day in 0..total {
        let status = if day < present {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Absent
        };
        store
            .insert_attendance(&Attendance {
                student_id: student.student_id,
                session_id: session.session_id,
                date: first + chrono::Days::new(u64::from(day)),
                status,
                marked_at: Utc::now(),
            })
            .unwrap();
    }
}
