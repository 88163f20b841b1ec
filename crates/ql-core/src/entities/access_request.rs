use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::AccessStatus;

/// A student's intent to use a question bank, subject to approval.
///
/// At most one request exists per (student, bank) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessRequest {
    pub id: String,
    pub student_id: String,
    pub bank_id: String,
    pub status: AccessStatus,
    pub created_at: DateTime<Utc>,
}
