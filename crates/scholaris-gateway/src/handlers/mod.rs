//! HTTP request handlers.
//!
//! This module contains all the endpoint handlers for the gateway API.

use std::str::FromStr;

use crate::error::ApiError;

pub mod attendance;
pub mod health;
pub mod promotion;
pub mod sessions;

/// Parse an id path segment, naming the id kind in the error.
fn parse_id<T: FromStr>(kind: &str, s: &str) -> Result<T, ApiError> {
    s.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {kind} ID: {s}")))
}
