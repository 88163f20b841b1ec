use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A student account, merging up to two identity channels.
///
/// A row is created the first time either channel is observed: the first
/// inbound chat message, or the first registration attempt carrying a
/// messaging key. `linked` is true only once both an email/password
/// credential and a messaging identity sit on the same row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    /// Opaque identifier from the chat transport. Unique when present.
    pub line_user_id: Option<String>,
    /// Unique when present.
    pub email: Option<String>,
    /// PHC-format Argon2id hash. Never the plaintext password.
    pub password_hash: Option<String>,
    pub linked: bool,
    pub created_at: DateTime<Utc>,
}
