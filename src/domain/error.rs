use thiserror::Error;

/// Expected, user-facing failure kinds raised by services and validators.
/// Only the presentation layer maps these to HTTP statuses.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Invariant(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
