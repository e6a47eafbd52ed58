//! Data models for the circulation core

pub mod copy;
pub mod loan;

// Re-export commonly used types
pub use copy::{Copy, CopyStatus};
pub use loan::Loan;
