use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered quiz question. Append-only; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerLog {
    pub id: String,
    pub student_id: String,
    pub bank_id: String,
    pub question_key: String,
    pub was_correct: bool,
    pub created_at: DateTime<Utc>,
}
