// ABOUTME: Storage error type shared by all storage structs
// ABOUTME: Converts into the domain taxonomy as an internal failure

use taskhive_core::DomainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage failures are never user errors; the API boundary logs them and
/// answers with a generic internal message.
impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        DomainError::Internal(err.to_string())
    }
}
