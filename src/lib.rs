//! Circulation core
//!
//! A transactional, library-level API that tracks physical copies of
//! catalog titles and mediates their exclusive possession by borrowers:
//! `acquire` borrows a copy, `release` returns it. Per-copy row locking
//! makes both operations race-free, and the loan ledger keeps a permanent
//! audit trail of every possession interval.
//!
//! Catalog metadata, identity management, and any HTTP/CLI surface live in
//! external collaborators; this crate only owns the possession state
//! machine and its ledger.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use models::{Copy, CopyStatus, Loan};
pub use services::possession::PossessionService;
