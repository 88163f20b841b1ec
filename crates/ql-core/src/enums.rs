//! Status enum for access requests.
//!
//! Uses `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! so the stored TEXT column and the JSON representation agree.
//! `allowed_next_states()` enforces valid transitions at the application
//! layer; the conditional UPDATE in ql-db is the storage-level backstop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a student's request to access a question bank.
///
/// ```text
/// pending → approved
///         → rejected
/// ```
///
/// A request is created as `pending`, or directly as `approved` when the
/// bank does not require approval. `approved` and `rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    Pending,
    Approved,
    Rejected,
}

impl AccessStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved | Self::Rejected => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
