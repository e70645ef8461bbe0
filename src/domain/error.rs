//! Domain Layer - Errors
//!
//! Every fallible engine operation returns `DomainResult`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common result type for engine operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Engine-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DomainError {
    /// The authoritative source could not produce a snapshot
    #[error("Authoritative source unavailable: {0}")]
    AdapterUnavailable(String),

    /// A stored document failed schema validation on load
    #[error("Stored layout is invalid: {0}")]
    StoredDataInvalid(String),

    /// A document failed schema validation on save
    #[error("Invalid layout: {0}")]
    Validation(String),

    /// Reconciliation was re-entered while already running for this request
    #[error("Recursive layout reconciliation detected")]
    RecursionDetected,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Validation(e.to_string())
    }
}
