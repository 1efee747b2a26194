//! Academic session control for scholaris.
//!
//! This crate provides the business logic for closing one school year and
//! opening the next: the session registry, attendance aggregation, promotion
//! evaluation and the rollover saga.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Gateway (HTTP)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ControlService                        │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌──────────┐  │
//! │  │  Session   │ │ Attendance │ │ Promotion  │ │ Rollover │  │
//! │  │  Registry  │ │ Aggregator │ │ Evaluator  │ │   Saga   │  │
//! │  └────────────┘ └────────────┘ └────────────┘ └──────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                       ┌──────────────┐
//!                       │    Store     │
//!                       │  (RocksDB)   │
//!                       └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use scholaris_control::{AcademicControl, ControlService, CreateSessionRequest};
//! use scholaris_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/scholaris")?);
//! let control = ControlService::with_defaults(store);
//!
//! let session = control
//!     .start_session(CreateSessionRequest::new(
//!         "2025-2026",
//!         NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
//!     ))
//!     .await?;
//!
//! let run = control.auto_rollover(&session.session_id).await?;
//! println!("Rolled over into {:?}", run.target_session_name);
//! # Ok(())
//! # }
//! ```
//!
//! # Session lifecycle
//!
//! Sessions move one way through `Active` → `Completed` → `Archived`. See the
//! [`lifecycle`] module for transition validation helpers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod attendance;
pub mod bulk;
pub mod error;
pub mod lifecycle;
pub mod promotion;
pub mod registry;
pub mod rollover;
pub mod service;
pub mod types;

#[cfg(test)]
mod testing;

pub use attendance::AttendanceSummary;
pub use bulk::{BulkItemError, BulkOutcome};
pub use error::{ControlError, Result};
pub use promotion::{AttendanceEvaluator, GradeCheck, PromotionEvaluator, Verdict};
pub use rollover::{derive_next_dates, derive_next_label, Rollover};
pub use service::{AcademicControl, ControlService};
pub use types::{
    AttendanceMark, AttendanceReport, BulkPromoteRequest, CompletionReport, ControlConfig,
    CreateSessionRequest, MarkAttendanceRequest, PromoteRequest, PromotionBreakdown,
    PromotionReport, PromotionStatusReport, SessionAnalytics, StudentVerdict,
};

// Re-export commonly used types from dependencies for convenience
pub use scholaris_core::{RunId, SessionId, StudentId};
pub use scholaris_store::{
    Attendance, AttendanceStatus, PromotionCriteria, PromotionStatus, RolloverRun,
    RolloverStatus, Session, SessionStatus, Student,
};
