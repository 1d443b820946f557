//! Business logic for users and tasks.
//!
//! Handlers stay thin: they decode requests, call into these services and
//! map `ServiceError` onto HTTP responses.

pub mod pagination;
pub mod task_service;
pub mod user_service;
pub mod validation;

use thiserror::Error;
use validation::FieldErrors;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("user `{0}` not found")]
    UserNotFound(i64),
    #[error("task `{0}` not found")]
    TaskNotFound(i64),
    #[error("invalid page")]
    InvalidPage,
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Return true if SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

/// Return true if SQLx error indicates a foreign key constraint violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("foreign key")
    )
}
