use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A content collection students join by redeeming its invite code.
///
/// The invite code is immutable once issued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionBank {
    pub id: String,
    pub creator_id: String,
    pub name: String,
    pub invite_code: String,
    /// When false, redeeming the invite code grants access immediately.
    pub requires_approval: bool,
    pub created_at: DateTime<Utc>,
}
