//! Service layer hosting the identity reconciliation and access control
//! engines.
//!
//! `QuizService` wraps `QuizDb` (raw database access). All engine methods
//! are implemented as `impl QuizService` blocks in the `repos` modules. The
//! service is the only mutation/query surface; no collaborator writes to
//! student identity fields or access-request status directly.

use ql_config::QlConfig;

use crate::QuizDb;
use crate::error::DatabaseError;

/// Orchestrates all store mutations and queries.
///
/// Each operation is synchronous complete-or-failed from the caller's view:
/// no cancellation, no timeout beyond the store's own I/O behavior.
pub struct QuizService {
    db: QuizDb,
}

impl QuizService {
    /// Create a new service over a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` — Path to the libsql database file, or `":memory:"` for
    ///   tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = QuizDb::open_local(db_path).await?;
        Ok(Self { db })
    }

    /// Create a new service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the configured database cannot be opened.
    pub async fn from_config(config: &QlConfig) -> Result<Self, DatabaseError> {
        Self::new_local(&config.database.path).await
    }

    /// Create from an existing `QuizDb` (for testing).
    #[must_use]
    pub const fn from_db(db: QuizDb) -> Self {
        Self { db }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &QuizDb {
        &self.db
    }
}
