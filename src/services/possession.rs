//! Possession service: the transactional borrow/return core
//!
//! Both state-changing operations run as a single Postgres transaction and
//! serialize on an exclusive lock on the copy row, taken before any other
//! read. The lock order is always copy then loan, so concurrent acquire and
//! release calls on the same copy cannot deadlock; operations on distinct
//! copies never block each other. Any error before commit rolls the whole
//! transaction back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{copy::CopyStatus, loan::Loan},
    repository::{borrowers::BorrowerDirectory, Repository},
};

#[derive(Clone)]
pub struct PossessionService {
    repository: Repository,
    borrowers: Arc<dyn BorrowerDirectory>,
    lock_timeout_ms: u64,
}

impl PossessionService {
    pub fn new(
        repository: Repository,
        borrowers: Arc<dyn BorrowerDirectory>,
        config: LoansConfig,
    ) -> Self {
        Self {
            repository,
            borrowers,
            lock_timeout_ms: config.lock_timeout_ms,
        }
    }

    /// Borrow a copy: `Available -> Possessed`.
    ///
    /// Of two concurrent callers, exactly one observes `Available` under
    /// the copy lock and wins; the other fails with `CopyNotAvailable` or
    /// `AlreadyLoaned`. Every failure aborts the transaction with no
    /// partial mutation.
    ///
    /// `due_at` must be strictly in the future at the start of the call.
    pub async fn acquire(
        &self,
        copy_id: i32,
        borrower_id: i32,
        due_at: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let now = Utc::now();
        if due_at <= now {
            return Err(AppError::DueDateNotInFuture { due_at });
        }

        let mut tx = self.begin().await?;

        let copy = self.repository.copies.lock_by_id(&mut tx, copy_id).await?;

        if copy.status != CopyStatus::Available {
            return Err(AppError::CopyNotAvailable {
                copy_id,
                status: copy.status,
            });
        }

        // Re-check the ledger under the lock: the status column could have
        // drifted from the loans table.
        if let Some(active) = self
            .repository
            .loans
            .lock_active_for_copy(&mut tx, copy_id)
            .await?
        {
            tracing::warn!(
                copy_id,
                loan_id = active.id,
                "copy marked available but has an active loan"
            );
            return Err(AppError::AlreadyLoaned { copy_id });
        }

        // On the transaction's connection: a second pool checkout here
        // could exhaust the pool once every connection sits in an open
        // possession transaction.
        if !self.borrowers.exists(&mut tx, borrower_id).await? {
            return Err(AppError::BorrowerNotFound { borrower_id });
        }

        let loan = self
            .repository
            .loans
            .insert(&mut tx, copy_id, borrower_id, now, due_at)
            .await?;
        self.repository
            .copies
            .mark_possessed(&mut tx, copy_id, now, due_at)
            .await?;

        tx.commit().await?;

        tracing::info!(copy_id, borrower_id, loan_id = loan.id, "copy acquired");
        Ok(loan)
    }

    /// Return a copy: `Possessed -> Available`.
    ///
    /// Only the borrower holding the active loan may release it. Returning
    /// an overdue copy is allowed; overdue is a derived predicate, never
    /// stored. A copy marked `Damaged`/`Lost` mid-loan keeps that status:
    /// the loan closes, the checkout fields clear, the status stands.
    pub async fn release(&self, copy_id: i32, borrower_id: i32) -> AppResult<Loan> {
        let mut tx = self.begin().await?;

        // Copy lock first, then the loan lock, same order as acquire.
        let copy = self.repository.copies.lock_by_id(&mut tx, copy_id).await?;

        let active = self
            .repository
            .loans
            .lock_active_for_copy(&mut tx, copy_id)
            .await?
            .ok_or(AppError::NoActiveLoan { copy_id })?;

        if active.borrower_id != borrower_id {
            return Err(AppError::UnauthorizedReturn {
                copy_id,
                borrower_id,
            });
        }

        let loan = self
            .repository
            .loans
            .close(&mut tx, active.id, copy_id, Utc::now())
            .await?;

        match copy.status {
            // Damaged/Lost are owned by catalog maintenance; closing the
            // loan must not transition the copy out of them. Only the
            // checkout projections are cleared.
            CopyStatus::Damaged | CopyStatus::Lost => {
                self.repository
                    .copies
                    .clear_checkout(&mut tx, copy_id)
                    .await?;
            }
            _ => {
                self.repository
                    .copies
                    .mark_available(&mut tx, copy_id)
                    .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(copy_id, borrower_id, loan_id = loan.id, "copy released");
        Ok(loan)
    }

    /// Current active loan for a copy, if any
    pub async fn active_loan(&self, copy_id: i32) -> AppResult<Option<Loan>> {
        self.repository.loans.active_for_copy(copy_id).await
    }

    /// Loans of a borrower, active first, most recent first
    pub async fn loans_for_borrower(&self, borrower_id: i32) -> AppResult<Vec<Loan>> {
        self.repository.loans.for_borrower(borrower_id).await
    }

    /// Full audit trail for a copy, most recent first
    pub async fn history_for_copy(&self, copy_id: i32) -> AppResult<Vec<Loan>> {
        self.repository.loans.history_for_copy(copy_id).await
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        self.repository.loans.count_active().await
    }

    /// Count overdue loans
    pub async fn count_overdue(&self) -> AppResult<i64> {
        self.repository.loans.count_overdue().await
    }

    /// Open a transaction with a bounded lock wait. `SET LOCAL` scopes the
    /// timeout to this transaction only.
    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.repository.pool.begin().await?;
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout_ms
        ))
        .execute(&mut *tx)
        .await?;
        Ok(tx)
    }
}
