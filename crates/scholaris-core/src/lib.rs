//! Core types and utilities for scholaris.
//!
//! This crate provides the foundational types used throughout the scholaris
//! session-rollover engine:
//!
//! - **Identifiers**: Strongly-typed ids for sessions, classes, students,
//!   teachers and rollover runs
//! - **Grade progression**: The pure grade ladder used to decide where a
//!   promoted student goes next
//!
//! # Example
//!
//! ```
//! use scholaris_core::{next_grade, NextGrade, SessionId};
//!
//! let session_id = SessionId::generate();
//! let parsed: SessionId = session_id.to_string().parse().unwrap();
//! assert_eq!(session_id, parsed);
//!
//! assert_eq!(next_grade("3"), NextGrade::Grade("4".to_string()));
//! assert_eq!(next_grade("12"), NextGrade::Graduate);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod grade;
pub mod ids;

pub use grade::{is_known_grade, next_grade, NextGrade, GRADE_SEQUENCE};
pub use ids::{ClassId, IdError, RunId, SessionId, StudentId, TeacherId};
