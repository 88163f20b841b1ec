//! Identity reconciliation engine.
//!
//! Guarantees that a messaging identity and a credential identity resolve
//! to exactly one student record, regardless of the order in which the two
//! channels are first seen. This module is the sole writer of student
//! identity fields.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;

use ql_core::entities::Student;
use ql_core::ids::PREFIX_STUDENT;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, parse_datetime};
use crate::service::QuizService;

const SELECT_COLS: &str = "id, line_user_id, email, password_hash, linked, created_at";

fn row_to_student(row: &libsql::Row) -> Result<Student, DatabaseError> {
    Ok(Student {
        id: row.get(0)?,
        line_user_id: get_opt_string(row, 1)?,
        email: get_opt_string(row, 2)?,
        password_hash: get_opt_string(row, 3)?,
        linked: get_bool(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

/// Hash a password with Argon2id (salted, slow) off the async executor.
///
/// The hash runs on the blocking pool so a CPU-bound derivation never
/// stalls store I/O scheduled on the same worker.
pub(crate) async fn hash_password(password: &str) -> Result<String, DatabaseError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DatabaseError::Query(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| DatabaseError::Other(e.into()))?
}

impl QuizService {
    /// Look up a student by messaging-identity key, creating the row on
    /// first contact. Returns `(student_id, linked)`.
    ///
    /// This is the entry point used on every inbound chat message. The
    /// get-or-create is an atomic upsert: insert under the `line_user_id`
    /// uniqueness constraint with `DO NOTHING`, then re-read the winning
    /// row. Two near-simultaneous first messages therefore produce exactly
    /// one row.
    pub async fn resolve_messaging_identity(
        &self,
        messaging_key: &str,
    ) -> Result<(String, bool), DatabaseError> {
        let candidate_id = self.db().generate_id(PREFIX_STUDENT).await?;
        let now = Utc::now().to_rfc3339();

        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT INTO students (id, line_user_id, linked, created_at) \
                 VALUES (?1, ?2, 0, ?3) \
                 ON CONFLICT(line_user_id) DO NOTHING",
                libsql::params![candidate_id.as_str(), messaging_key, now],
            )
            .await?;
        if inserted > 0 {
            tracing::debug!(student_id = %candidate_id, "new student from messaging channel");
        }

        // Winner or loser, the canonical row is whatever holds the key now.
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, linked FROM students WHERE line_user_id = ?1",
                [messaging_key],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok((row.get(0)?, get_bool(&row, 1)?))
    }

    /// Merge a credential identity onto the student row holding
    /// `messaging_key`, creating that row if the registration arrives
    /// before any chat message. Returns the student ID.
    ///
    /// Fails with `IdentityConflict` when the email is already held by a
    /// row bound to a different messaging key. When two registrations race
    /// on the same new email, the email uniqueness constraint decides: one
    /// succeeds, the other gets `Uniqueness`. The credential write is a
    /// single UPDATE statement, so no partially-updated row is ever
    /// observable.
    ///
    /// Calling again with identical arguments succeeds again; the conflict
    /// check excludes the caller's own key.
    pub async fn register_or_bind(
        &self,
        email: &str,
        password: &str,
        messaging_key: &str,
    ) -> Result<String, DatabaseError> {
        if email.is_empty() || password.is_empty() || messaging_key.is_empty() {
            return Err(DatabaseError::Validation(
                "email, password, and messaging key are all required".into(),
            ));
        }

        // Business rule: an email may belong to at most one messaging
        // identity. This check is advisory; the UNIQUE constraint below is
        // the correctness mechanism under races.
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id FROM students \
                 WHERE email = ?1 AND line_user_id IS NOT NULL AND line_user_id <> ?2",
                libsql::params![email, messaging_key],
            )
            .await?;
        if rows.next().await?.is_some() {
            return Err(DatabaseError::IdentityConflict(format!(
                "email '{email}' is already bound to a different messaging identity"
            )));
        }

        let (student_id, _) = self.resolve_messaging_identity(messaging_key).await?;

        // CPU-bound; runs on the blocking pool with no store state held.
        let password_hash = hash_password(password).await?;

        self.db()
            .conn()
            .execute(
                "UPDATE students SET email = ?1, password_hash = ?2, linked = 1 WHERE id = ?3",
                libsql::params![email, password_hash.as_str(), student_id.as_str()],
            )
            .await
            .map_err(DatabaseError::from_constraint)?;

        tracing::debug!(student_id = %student_id, "credential identity bound");
        Ok(student_id)
    }

    /// Fetch a student row by ID.
    pub async fn get_student(&self, id: &str) -> Result<Student, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM students WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_student(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_service;

    #[tokio::test]
    async fn first_contact_creates_student() {
        let svc = test_service().await;

        let (id, linked) = svc.resolve_messaging_identity("U1").await.unwrap();
        assert!(id.starts_with("stu-"));
        assert!(!linked);

        let student = svc.get_student(&id).await.unwrap();
        assert_eq!(student.line_user_id.as_deref(), Some("U1"));
        assert!(student.email.is_none());
        assert!(!student.linked);
    }

    #[tokio::test]
    async fn repeated_contact_is_idempotent() {
        let svc = test_service().await;

        let (first, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        let (second, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        assert_eq!(first, second);

        let mut rows = svc
            .db()
            .conn()
            .query("SELECT count(*) FROM students", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn register_after_chat_binds_same_row() {
        let svc = test_service().await;

        let (chat_id, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        let bound_id = svc
            .register_or_bind("a@x.com", "hunter2", "U1")
            .await
            .unwrap();
        assert_eq!(chat_id, bound_id);

        let student = svc.get_student(&bound_id).await.unwrap();
        assert!(student.linked);
        assert_eq!(student.email.as_deref(), Some("a@x.com"));
    }

    #[tokio::test]
    async fn register_before_chat_creates_row() {
        let svc = test_service().await;

        let id = svc
            .register_or_bind("a@x.com", "hunter2", "U1")
            .await
            .unwrap();
        let student = svc.get_student(&id).await.unwrap();
        assert!(student.linked);
        assert_eq!(student.line_user_id.as_deref(), Some("U1"));

        // A later chat message resolves to the same row
        let (chat_id, linked) = svc.resolve_messaging_identity("U1").await.unwrap();
        assert_eq!(chat_id, id);
        assert!(linked);
    }

    #[tokio::test]
    async fn register_is_idempotent() {
        let svc = test_service().await;

        let first = svc
            .register_or_bind("a@x.com", "hunter2", "U1")
            .await
            .unwrap();
        let second = svc
            .register_or_bind("a@x.com", "hunter2", "U1")
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut rows = svc
            .db()
            .conn()
            .query("SELECT count(*) FROM students WHERE linked = 1", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn email_claimed_by_other_key_conflicts() {
        let svc = test_service().await;

        let first = svc
            .register_or_bind("a@x.com", "pw1", "U1")
            .await
            .unwrap();
        let before = svc.get_student(&first).await.unwrap();

        let result = svc.register_or_bind("a@x.com", "pw2", "U2").await;
        assert!(matches!(result, Err(DatabaseError::IdentityConflict(_))));

        // First student's email and hash unchanged
        let after = svc.get_student(&first).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn email_held_without_messaging_key_is_uniqueness() {
        let svc = test_service().await;

        // A credential-only row already holds the email; the advisory
        // conflict check skips it, so the UNIQUE constraint decides.
        svc.db()
            .conn()
            .execute(
                "INSERT INTO students (id, email, password_hash, linked) \
                 VALUES ('stu-holder', 'a@x.com', 'hash', 1)",
                (),
            )
            .await
            .unwrap();

        let result = svc.register_or_bind("a@x.com", "pw", "U9").await;
        assert!(matches!(result, Err(DatabaseError::Uniqueness(_))));

        // The loser's row exists but stays unlinked, with no email
        let (id, linked) = svc.resolve_messaging_identity("U9").await.unwrap();
        assert!(!linked);
        let student = svc.get_student(&id).await.unwrap();
        assert!(student.email.is_none());
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let svc = test_service().await;

        for (email, pw, key) in [("", "pw", "U1"), ("a@x.com", "", "U1"), ("a@x.com", "pw", "")] {
            let result = svc.register_or_bind(email, pw, key).await;
            assert!(matches!(result, Err(DatabaseError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn password_is_hashed_and_salted() {
        let svc = test_service().await;

        let id = svc
            .register_or_bind("a@x.com", "hunter2", "U1")
            .await
            .unwrap();
        let student = svc.get_student(&id).await.unwrap();
        let hash = student.password_hash.unwrap();
        assert!(hash.starts_with("$argon2"), "PHC string expected: {hash}");
        assert_ne!(hash, "hunter2");

        // A fresh salt per hash: same password, different output
        let other = hash_password("hunter2").await.unwrap();
        assert_ne!(hash, other);
    }

    #[tokio::test]
    async fn get_student_unknown_id() {
        let svc = test_service().await;
        let result = svc.get_student("stu-nope").await;
        assert!(matches!(result, Err(DatabaseError::NoResult)));
    }
}
