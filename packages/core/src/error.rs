// ABOUTME: Shared error taxonomy for domain operations
// ABOUTME: Each variant maps to one HTTP status class at the API boundary

use thiserror::Error;

/// Domain errors raised by managers and resolved to HTTP statuses by the
/// API layer: 401, 404, 403, 400, 400, 500 in declaration order.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Internal(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        DomainError::Unauthenticated(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DomainError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        DomainError::InvalidState(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DomainError::Internal(message.into())
    }
}
