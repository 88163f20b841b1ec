//! Database and engine error types for ql-db.

use thiserror::Error;

/// Errors from store and engine operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Caller input malformed or missing. Reported to the caller, no retry.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The email is already bound to a different messaging identity.
    #[error("Identity conflict: {0}")]
    IdentityConflict(String),

    /// A storage-level unique constraint fired, typically when two
    /// reconciliations race on the same new email.
    #[error("Uniqueness violation: {0}")]
    Uniqueness(String),

    /// No question bank matches the given invite code.
    #[error("Unknown invite code: {0}")]
    UnknownInviteCode(String),

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity} {id} from {from} to {to}")]
    InvalidTransition {
        entity: String,
        id: String,
        from: String,
        to: String,
    },

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Underlying libsql error.
    #[error("libsql error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Promote a libsql error to [`DatabaseError::Uniqueness`] when it is a
    /// unique-constraint failure, keeping everything else as-is.
    ///
    /// The predicate is intentionally narrow: only SQLite's
    /// `UNIQUE constraint failed` message is promoted, so genuine SQL errors
    /// keep their own variant.
    #[must_use]
    pub fn from_constraint(e: libsql::Error) -> Self {
        let msg = e.to_string();
        if msg.contains("UNIQUE constraint failed") {
            Self::Uniqueness(msg)
        } else {
            Self::LibSql(e)
        }
    }
}
