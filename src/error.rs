//! Error types for the circulation core

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::copy::CopyStatus;

/// Postgres "lock_not_available", raised when `lock_timeout` expires.
const PG_LOCK_NOT_AVAILABLE: &str = "55P03";
/// Postgres "unique_violation".
const PG_UNIQUE_VIOLATION: &str = "23505";

/// Closed set of failure conditions surfaced by the possession service.
///
/// Every variant except `LockTimeout` reports a genuine state or
/// authorization violation and must not be retried blindly. All of them are
/// raised before commit, so callers never observe a half-updated copy/loan
/// pair.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Copy {copy_id} does not exist")]
    CopyNotFound { copy_id: i32 },

    #[error("Borrower {borrower_id} does not exist")]
    BorrowerNotFound { borrower_id: i32 },

    #[error("Copy {copy_id} is not available (status: {status})")]
    CopyNotAvailable { copy_id: i32, status: CopyStatus },

    #[error("Copy {copy_id} already has an active loan")]
    AlreadyLoaned { copy_id: i32 },

    #[error("No active loan for copy {copy_id}")]
    NoActiveLoan { copy_id: i32 },

    #[error("Borrower {borrower_id} does not hold copy {copy_id}")]
    UnauthorizedReturn { copy_id: i32, borrower_id: i32 },

    #[error("Due date {due_at} is not in the future")]
    DueDateNotInFuture { due_at: DateTime<Utc> },

    #[error("Timed out waiting for the lock on copy {copy_id}")]
    LockTimeout { copy_id: i32 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Only lock timeouts are safe to retry: the transaction never got the
    /// copy lock, so no mutation has occurred.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::LockTimeout { .. })
    }

    /// Translate an error raised while waiting on the copy or loan row
    /// lock.
    pub(crate) fn from_lock_wait(err: sqlx::Error, copy_id: i32) -> Self {
        match pg_code(&err).as_deref() {
            Some(PG_LOCK_NOT_AVAILABLE) => AppError::LockTimeout { copy_id },
            _ => AppError::Database(err),
        }
    }

    /// Translate a loan-insert failure. A unique violation comes from the
    /// partial index backing the one-active-loan invariant and means
    /// another transaction won the race.
    pub(crate) fn from_loan_insert(err: sqlx::Error, copy_id: i32) -> Self {
        match pg_code(&err).as_deref() {
            Some(PG_UNIQUE_VIOLATION) => AppError::AlreadyLoaned { copy_id },
            _ => AppError::Database(err),
        }
    }
}

fn pg_code(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

/// Result type alias for circulation operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lock_timeout_is_retryable() {
        assert!(AppError::LockTimeout { copy_id: 1 }.is_retryable());

        let others = [
            AppError::CopyNotFound { copy_id: 1 },
            AppError::BorrowerNotFound { borrower_id: 42 },
            AppError::CopyNotAvailable {
                copy_id: 1,
                status: CopyStatus::Damaged,
            },
            AppError::AlreadyLoaned { copy_id: 1 },
            AppError::NoActiveLoan { copy_id: 1 },
            AppError::UnauthorizedReturn {
                copy_id: 1,
                borrower_id: 42,
            },
        ];
        for err in others {
            assert!(!err.is_retryable(), "{err} must not be retryable");
        }
    }

    #[test]
    fn messages_carry_structured_context() {
        let err = AppError::CopyNotAvailable {
            copy_id: 7,
            status: CopyStatus::Lost,
        };
        assert_eq!(err.to_string(), "Copy 7 is not available (status: lost)");

        let err = AppError::UnauthorizedReturn {
            copy_id: 3,
            borrower_id: 9,
        };
        assert_eq!(err.to_string(), "Borrower 9 does not hold copy 3");
    }
}
