//! HTTP gateway for the scholaris academic session service.
//!
//! This crate provides the public-facing JSON API over the control service.
//! It handles:
//!
//! - Session lifecycle endpoints (start, complete, archive)
//! - The auto-rollover endpoint and run resumption
//! - Promotion and attendance endpoints
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Clients                            │
//! │                           (HTTP)                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     scholaris-gateway                       │
//! │        ┌─────────────┐         ┌─────────────────┐          │
//! │        │   Router    │         │    ApiError     │          │
//! │        │ + Handlers  │         │    mapping      │          │
//! │        └─────────────┘         └─────────────────┘          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                     ┌──────────────────┐
//!                     │  ControlService  │
//!                     └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use scholaris_control::ControlService;
//! use scholaris_gateway::{create_router, GatewayConfig, GatewayState};
//! use scholaris_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/scholaris")?);
//! let control = Arc::new(ControlService::with_defaults(store));
//!
//! let state = GatewayState::new(control, GatewayConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
