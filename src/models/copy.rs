//! Copy (physical inventory unit) model and status codes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Possession status of a copy, stored as a smallint code.
///
/// Only the `Available <-> Possessed` transitions are driven by this crate.
/// `Damaged` and `Lost` are administrative states owned by catalog
/// maintenance; the possession service never enters or leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum CopyStatus {
    Available = 0,
    Possessed = 1,
    Damaged = 2,
    Lost = 3,
}

impl std::fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CopyStatus::Available => "available",
            CopyStatus::Possessed => "possessed",
            CopyStatus::Damaged => "damaged",
            CopyStatus::Lost => "lost",
        };
        write!(f, "{}", label)
    }
}

/// Copy row as persisted.
///
/// Catalog fields (title, barcode, shelf location, ...) belong to the
/// external catalog store and are not mapped here. `checkout_at` and
/// `due_at` are denormalized projections of the current active loan: both
/// are NULL exactly when the status is not `Possessed`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Copy {
    pub id: i32,
    pub status: CopyStatus,
    pub checkout_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
}

impl Copy {
    pub fn is_available(&self) -> bool {
        self.status == CopyStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels() {
        assert_eq!(CopyStatus::Available.to_string(), "available");
        assert_eq!(CopyStatus::Possessed.to_string(), "possessed");
        assert_eq!(CopyStatus::Damaged.to_string(), "damaged");
        assert_eq!(CopyStatus::Lost.to_string(), "lost");
    }

    #[test]
    fn only_available_copies_are_available() {
        let mut copy = Copy {
            id: 1,
            status: CopyStatus::Available,
            checkout_at: None,
            due_at: None,
        };
        assert!(copy.is_available());

        for status in [CopyStatus::Possessed, CopyStatus::Damaged, CopyStatus::Lost] {
            copy.status = status;
            assert!(!copy.is_available());
        }
    }
}
