// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Mutator Error Types
 * Error handling for request normalization, traversal and dispatch
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::time::Duration;
use thiserror::Error;

use crate::request::Section;

/// Main mutator error type
#[derive(Error, Debug)]
pub enum MutatorError {
    /// A loosely-typed record is missing a required field
    #[error("Schema error: missing or invalid field '{field}'")]
    Schema { field: String },

    /// A structured value cannot be traversed safely
    #[error("Structure error: {reason}")]
    Structure { reason: String },

    /// A query string or body does not match its content type
    #[error("Cannot normalize {section}: {reason}")]
    Normalize { section: Section, reason: String },

    /// A mutation no longer addresses a slot in the working request
    #[error("Mutation path error: {0}")]
    Path(String),

    /// Dispatch errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of a single HTTP call. Always non-fatal for the run.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Connection to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Request failed: {0}")]
    Other(String),
}

impl DispatchError {
    /// Timeouts and connection failures are worth reporting as network trouble
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            DispatchError::Timeout { .. } | DispatchError::Connection { .. }
        )
    }
}

/// Convert reqwest errors to dispatch errors
impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();

        if err.is_timeout() {
            DispatchError::Timeout {
                url,
                timeout: Duration::from_secs(30),
            }
        } else if err.is_connect() {
            DispatchError::Connection {
                url,
                reason: err.to_string(),
            }
        } else if err.is_builder() {
            DispatchError::InvalidRequest {
                reason: err.to_string(),
            }
        } else {
            DispatchError::Other(err.to_string())
        }
    }
}

/// Result type for mutator operations
pub type MutatorResult<T> = Result<T, MutatorError>;
