//! Unified error types for Mast
//!
//! These cover usage and configuration mistakes only. A failed assertion
//! is never an error: it becomes a Fail log line on the scenario and the
//! chain keeps running.

use crate::types::ResponseKind;
use thiserror::Error;

/// Unified error type for all Mast operations
#[derive(Error, Debug)]
pub enum MastError {
    // Suite configuration errors
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error("scenario not ready: {0}")]
    ScenarioNotReady(String),

    // Response capability errors
    #[error("{kind} response does not support {operation}")]
    UnsupportedOperation {
        kind: ResponseKind,
        operation: String,
    },

    #[error("malformed {kind} body: {detail}")]
    MalformedBody { kind: ResponseKind, detail: String },

    // Fetch collaborator errors
    #[error("fetch failed: {0}")]
    Fetch(String),

    // I/O and parsing errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl MastError {
    /// Shorthand for the capability-rejection contract
    pub fn unsupported(kind: ResponseKind, operation: &str) -> Self {
        Self::UnsupportedOperation {
            kind,
            operation: operation.to_string(),
        }
    }
}

/// Result type alias using MastError
pub type Result<T> = std::result::Result<T, MastError>;
