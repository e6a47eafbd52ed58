//! Loan (possession interval) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One borrower's possession interval over one copy.
///
/// `copy_id` and `borrower_id` are references, not ownership. A loan is
/// "active" while `returned_at` is NULL; closing it sets `returned_at`
/// exactly once and no other field ever changes after creation. Loans are
/// never deleted by the possession operations, they form a permanent audit
/// ledger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub copy_id: i32,
    pub borrower_id: i32,
    pub borrowed_at: DateTime<Utc>,
    pub due_back: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// A loan is active while it has not been returned.
    pub fn is_active(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Derived predicate, never persisted: an active loan past its due
    /// date. Independent of whether a release later succeeds.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now > self.due_back
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn loan(due_back: DateTime<Utc>, returned_at: Option<DateTime<Utc>>) -> Loan {
        Loan {
            id: 1,
            copy_id: 1,
            borrower_id: 42,
            borrowed_at: due_back - Duration::days(14),
            due_back,
            returned_at,
        }
    }

    #[test]
    fn active_until_returned() {
        let now = Utc::now();
        assert!(loan(now, None).is_active());
        assert!(!loan(now, Some(now)).is_active());
    }

    #[test]
    fn overdue_only_after_due_back() {
        let now = Utc::now();
        assert!(!loan(now + Duration::days(1), None).is_overdue(now));
        // Exactly at the due date is not overdue yet.
        assert!(!loan(now, None).is_overdue(now));
        assert!(loan(now - Duration::seconds(1), None).is_overdue(now));
    }

    #[test]
    fn returned_loans_are_never_overdue() {
        let now = Utc::now();
        let past_due = now - Duration::days(3);
        assert!(!loan(past_due, Some(now)).is_overdue(now));
    }
}
