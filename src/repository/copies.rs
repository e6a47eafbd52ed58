//! Copies repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::copy::{Copy, CopyStatus},
};

#[derive(Clone)]
pub struct CopiesRepository {
    pool: Pool<Postgres>,
}

impl CopiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a copy by ID (plain read, no lock)
    pub async fn get_by_id(&self, id: i32) -> AppResult<Copy> {
        sqlx::query_as::<_, Copy>(
            "SELECT id, status, checkout_at, due_at FROM copies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CopyNotFound { copy_id: id })
    }

    /// Lock the copy row exclusively for the duration of the current
    /// transaction.
    ///
    /// This is the sole serialization point for possession operations on a
    /// copy; the wait is bounded by the transaction's `lock_timeout`.
    pub async fn lock_by_id(&self, tx: &mut PgConnection, id: i32) -> AppResult<Copy> {
        sqlx::query_as::<_, Copy>(
            "SELECT id, status, checkout_at, due_at FROM copies WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::from_lock_wait(e, id))?
        .ok_or(AppError::CopyNotFound { copy_id: id })
    }

    /// Mark a locked copy as possessed, projecting the new loan's checkout
    /// fields onto it.
    pub async fn mark_possessed(
        &self,
        tx: &mut PgConnection,
        id: i32,
        checkout_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE copies SET status = $1, checkout_at = $2, due_at = $3, updated_at = NOW() WHERE id = $4",
        )
        .bind(CopyStatus::Possessed)
        .bind(checkout_at)
        .bind(due_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        Ok(())
    }

    /// Clear the checkout fields of a locked copy without touching its
    /// status. Used when a loan closes on a copy that catalog maintenance
    /// moved to an administrative state mid-loan.
    pub async fn clear_checkout(&self, tx: &mut PgConnection, id: i32) -> AppResult<()> {
        sqlx::query(
            "UPDATE copies SET checkout_at = NULL, due_at = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        Ok(())
    }

    /// Mark a locked copy as available again, clearing the checkout fields.
    pub async fn mark_available(&self, tx: &mut PgConnection, id: i32) -> AppResult<()> {
        sqlx::query(
            "UPDATE copies SET status = $1, checkout_at = NULL, due_at = NULL, updated_at = NOW() WHERE id = $2",
        )
        .bind(CopyStatus::Available)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        Ok(())
    }
}
