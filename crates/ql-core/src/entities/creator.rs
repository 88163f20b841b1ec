use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question-bank creator. Exists here as the foreign-key target for
/// question banks; creator-facing flows live outside this core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Creator {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
