//! Repository layer for database operations

pub mod borrowers;
pub mod copies;
pub mod loans;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub copies: copies::CopiesRepository,
    pub loans: loans::LoansRepository,
    pub borrowers: borrowers::BorrowersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            copies: copies::CopiesRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            borrowers: borrowers::BorrowersRepository::new(),
            pool,
        }
    }
}
