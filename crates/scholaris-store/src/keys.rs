//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions to encode and decode keys for various indexes.
//! All ids are 16-byte UUIDs, so composite keys are fixed-width and support
//! efficient prefix scans.

use chrono::NaiveDate;
use scholaris_core::{ClassId, RunId, SessionId, StudentId};

/// Width of an encoded id.
pub const ID_LEN: usize = 16;

/// Key of the single entry in the current-session column family.
pub const CURRENT_SESSION_KEY: &[u8] = b"current";

/// Encode a pair of ids as `a || b`.
fn pair_key(a: &[u8; ID_LEN], b: &[u8; ID_LEN]) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 * ID_LEN);
    key.extend_from_slice(a);
    key.extend_from_slice(b);
    key
}

/// Encode a session name for the unique name index.
#[must_use]
pub fn session_name_key(name: &str) -> Vec<u8> {
    name.as_bytes().to_vec()
}

/// Encode a session-class index key: `session_id || class_id`.
#[must_use]
pub fn session_class_key(session_id: &SessionId, class_id: &ClassId) -> Vec<u8> {
    pair_key(session_id.as_bytes(), class_id.as_bytes())
}

/// Encode a class slot key: `session_id || name || 0x00 || section`.
///
/// The slot is unique per session, which is what makes class copying
/// idempotent.
#[must_use]
pub fn class_slot_key(session_id: &SessionId, name: &str, section: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(ID_LEN + name.len() + 1 + section.len());
    key.extend_from_slice(session_id.as_bytes());
    key.extend_from_slice(name.as_bytes());
    key.push(0);
    key.extend_from_slice(section.as_bytes());
    key
}

/// Encode a session-student index key: `session_id || student_id`.
#[must_use]
pub fn session_student_key(session_id: &SessionId, student_id: &StudentId) -> Vec<u8> {
    pair_key(session_id.as_bytes(), student_id.as_bytes())
}

/// Encode an attendance key: `student_id || session_id || YYYY-MM-DD`.
///
/// ISO dates sort chronologically, so a prefix scan yields marks in date order.
#[must_use]
pub fn attendance_key(student_id: &StudentId, session_id: &SessionId, date: NaiveDate) -> Vec<u8> {
    let mut key = attendance_prefix(student_id, session_id);
    key.extend_from_slice(date.format("%Y-%m-%d").to_string().as_bytes());
    key
}

/// Encode the prefix for all attendance marks of a student in a session.
#[must_use]
pub fn attendance_prefix(student_id: &StudentId, session_id: &SessionId) -> Vec<u8> {
    pair_key(student_id.as_bytes(), session_id.as_bytes())
}

/// Encode a source-run index key: `session_id || run_id`.
#[must_use]
pub fn source_run_key(session_id: &SessionId, run_id: &RunId) -> Vec<u8> {
    pair_key(session_id.as_bytes(), run_id.as_bytes())
}

/// Encode a single-id prefix for scanning a session's index entries.
#[must_use]
pub fn session_prefix(session_id: &SessionId) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}

/// Extract the trailing id from a `prefix_id || id` index key.
///
/// # Panics
///
/// Panics if the key is shorter than 32 bytes.
#[must_use]
pub fn extract_trailing_id(key: &[u8]) -> [u8; ID_LEN] {
    let mut bytes = [0u8; ID_LEN];
    bytes.copy_from_slice(&key[ID_LEN..2 * ID_LEN]);
    bytes
}

/// Decode a 16-byte id stored as an index value.
#[must_use]
pub fn decode_id(value: &[u8]) -> Option<[u8; ID_LEN]> {
    value.try_into().ok()
}
