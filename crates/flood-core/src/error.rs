//! Domain-level error types.

use std::time::Duration;

use thiserror::Error;

/// Flood control errors.
///
/// A `check` that returns one of these did not reach a decision. Callers must
/// treat it as "cannot determine", never as a denial.
#[derive(Debug, Error)]
pub enum FloodError {
    #[error("Invalid subject id: {0} (must be positive)")]
    InvalidSubject(i64),

    #[error("Invalid flood policy: {0}")]
    InvalidPolicy(String),

    #[error("Event store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Flood check timed out after {0:?}")]
    Timeout(Duration),
}

/// Event store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
