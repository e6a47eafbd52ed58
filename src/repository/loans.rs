//! Loan ledger repository for database operations
//!
//! The ledger is append-mostly: `insert` adds a row, `close` sets
//! `returned_at` exactly once, and nothing here ever deletes a loan.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::Loan,
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get the active loan for a copy, if any (plain read, no lock)
    pub async fn active_for_copy(&self, copy_id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE copy_id = $1 AND returned_at IS NULL",
        )
        .bind(copy_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Lock the unique active loan row for a copy, if one exists.
    ///
    /// Always called after the copy row lock is held (lock order: copy then
    /// loan), so two possession operations on the same copy can never
    /// deadlock here.
    pub async fn lock_active_for_copy(
        &self,
        tx: &mut PgConnection,
        copy_id: i32,
    ) -> AppResult<Option<Loan>> {
        sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE copy_id = $1 AND returned_at IS NULL FOR UPDATE",
        )
        .bind(copy_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::from_lock_wait(e, copy_id))
    }

    /// Insert a new open loan.
    ///
    /// The partial unique index on `(copy_id) WHERE returned_at IS NULL`
    /// backstops the check performed under the copy lock; a violation is
    /// reported as `AlreadyLoaned`.
    pub async fn insert(
        &self,
        tx: &mut PgConnection,
        copy_id: i32,
        borrower_id: i32,
        borrowed_at: DateTime<Utc>,
        due_back: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (copy_id, borrower_id, borrowed_at, due_back)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(copy_id)
        .bind(borrower_id)
        .bind(borrowed_at)
        .bind(due_back)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_loan_insert(e, copy_id))?;

        tracing::debug!(copy_id, borrower_id, loan_id = loan.id, "loan opened");
        Ok(loan)
    }

    /// Close a locked loan, setting `returned_at`.
    ///
    /// The `returned_at IS NULL` filter makes closing an already-closed
    /// loan surface as `NoActiveLoan` rather than a double write.
    pub async fn close(
        &self,
        tx: &mut PgConnection,
        loan_id: i32,
        copy_id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET returned_at = $1 WHERE id = $2 AND returned_at IS NULL RETURNING *",
        )
        .bind(returned_at)
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NoActiveLoan { copy_id })?;

        tracing::debug!(copy_id, loan_id, "loan closed");
        Ok(loan)
    }

    /// Get loans for a borrower, active first, most recent first
    pub async fn for_borrower(&self, borrower_id: i32) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE borrower_id = $1
            ORDER BY (returned_at IS NULL) DESC, borrowed_at DESC
            "#,
        )
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Full audit trail for a copy, most recent first
    pub async fn history_for_copy(&self, copy_id: i32) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE copy_id = $1 ORDER BY borrowed_at DESC",
        )
        .bind(copy_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE returned_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count overdue loans
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE returned_at IS NULL AND due_back < NOW()",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
