//! Borrowers repository and the borrower directory trait

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::error::AppResult;

/// Narrow view of the identity subsystem needed by the possession service.
///
/// Passed in explicitly rather than reached through a process-wide store,
/// so the core stays testable without a real identity subsystem. A borrower
/// is an opaque identifier here. The check runs on the possession
/// transaction's own connection: acquiring a second pool connection
/// mid-transaction could exhaust the pool under concurrent load.
#[async_trait]
pub trait BorrowerDirectory: Send + Sync {
    async fn exists(&self, conn: &mut PgConnection, borrower_id: i32) -> AppResult<bool>;
}

/// Postgres-backed borrower directory
#[derive(Clone, Default)]
pub struct BorrowersRepository;

impl BorrowersRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BorrowerDirectory for BorrowersRepository {
    async fn exists(&self, conn: &mut PgConnection, borrower_id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM borrowers WHERE id = $1)")
                .bind(borrower_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(exists)
    }
}
