//! Access control engine.
//!
//! Manages the lifecycle of a student's request to access a question bank,
//! keyed by invite-code redemption, and provides the single authorization
//! predicate quiz-delivery flows consult before serving a question.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use ql_core::entities::AccessRequest;
use ql_core::enums::AccessStatus;
use ql_core::ids::PREFIX_ACCESS;

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum};
use crate::service::QuizService;

const SELECT_COLS: &str = "id, student_id, bank_id, status, created_at";

fn row_to_access_request(row: &libsql::Row) -> Result<AccessRequest, DatabaseError> {
    Ok(AccessRequest {
        id: row.get(0)?,
        student_id: row.get(1)?,
        bank_id: row.get(2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

/// Outcome of redeeming an invite code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Redemption {
    pub bank_id: String,
    pub bank_name: String,
    pub status: AccessStatus,
}

/// One row of a student's "my question banks" listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentBankAccess {
    pub bank_name: String,
    pub status: AccessStatus,
}

impl QuizService {
    /// Redeem an invite code for a student.
    ///
    /// Creates the access request on first redemption — `approved`
    /// immediately when the bank skips approval, else `pending` — and on
    /// any later redemption reports the existing row's status unchanged.
    /// The insert rides on the `(student_id, bank_id)` uniqueness
    /// constraint with `DO NOTHING`, so a duplicate redemption is an
    /// idempotent no-op rather than an error, even under concurrency.
    ///
    /// # Errors
    ///
    /// `UnknownInviteCode` when no bank matches the code.
    pub async fn redeem_invite_code(
        &self,
        student_id: &str,
        code: &str,
    ) -> Result<Redemption, DatabaseError> {
        let bank = self
            .find_bank_by_invite_code(code)
            .await?
            .ok_or_else(|| DatabaseError::UnknownInviteCode(code.to_string()))?;

        let initial = if bank.requires_approval {
            AccessStatus::Pending
        } else {
            AccessStatus::Approved
        };

        let candidate_id = self.db().generate_id(PREFIX_ACCESS).await?;
        let now = Utc::now().to_rfc3339();
        self.db()
            .conn()
            .execute(
                "INSERT INTO access_requests (id, student_id, bank_id, status, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5) \
                 ON CONFLICT(student_id, bank_id) DO NOTHING",
                libsql::params![
                    candidate_id.as_str(),
                    student_id,
                    bank.id.as_str(),
                    initial.as_str(),
                    now
                ],
            )
            .await?;

        // Whichever row survived holds the authoritative status.
        let request = self.get_access_for_pair(student_id, &bank.id).await?;
        Ok(Redemption {
            bank_id: bank.id,
            bank_name: bank.name,
            status: request.status,
        })
    }

    /// True iff an `approved` access request exists for the pair.
    ///
    /// Pure read; this is the single gate any quiz-delivery flow must
    /// consult before serving a question.
    pub async fn is_authorized(
        &self,
        student_id: &str,
        bank_id: &str,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT 1 FROM access_requests \
                 WHERE student_id = ?1 AND bank_id = ?2 AND status = 'approved'",
                libsql::params![student_id, bank_id],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Approve or reject a pending access request.
    ///
    /// `approved` and `rejected` are terminal; deciding a request that is
    /// no longer pending fails with `InvalidTransition`. The conditional
    /// `WHERE status = 'pending'` makes the transition race-safe: of two
    /// concurrent decisions exactly one updates the row.
    pub async fn decide_request(
        &self,
        access_request_id: &str,
        approve: bool,
    ) -> Result<AccessRequest, DatabaseError> {
        let current = self.get_access_request(access_request_id).await?;
        let target = if approve {
            AccessStatus::Approved
        } else {
            AccessStatus::Rejected
        };

        let invalid_transition = || DatabaseError::InvalidTransition {
            entity: "access_request".into(),
            id: access_request_id.to_string(),
            from: current.status.as_str().into(),
            to: target.as_str().into(),
        };

        if !current.status.can_transition_to(target) {
            return Err(invalid_transition());
        }

        let updated = self
            .db()
            .conn()
            .execute(
                "UPDATE access_requests SET status = ?1 WHERE id = ?2 AND status = 'pending'",
                libsql::params![target.as_str(), access_request_id],
            )
            .await?;
        if updated == 0 {
            // Lost a race against another decision
            return Err(invalid_transition());
        }

        Ok(AccessRequest {
            status: target,
            ..current
        })
    }

    /// Read-only projection of a student's banks and request statuses.
    pub async fn list_requests_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<StudentBankAccess>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT b.name, a.status FROM access_requests a \
                 JOIN question_banks b ON b.id = a.bank_id \
                 WHERE a.student_id = ?1 \
                 ORDER BY a.created_at",
                [student_id],
            )
            .await?;

        let mut listing = Vec::new();
        while let Some(row) = rows.next().await? {
            listing.push(StudentBankAccess {
                bank_name: row.get(0)?,
                status: parse_enum(&row.get::<String>(1)?)?,
            });
        }
        Ok(listing)
    }

    /// Fetch an access request by ID.
    pub async fn get_access_request(&self, id: &str) -> Result<AccessRequest, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM access_requests WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_access_request(&row)
    }

    /// Fetch the access request for a (student, bank) pair.
    pub async fn get_access_for_pair(
        &self,
        student_id: &str,
        bank_id: &str,
    ) -> Result<AccessRequest, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM access_requests \
                     WHERE student_id = ?1 AND bank_id = ?2"
                ),
                libsql::params![student_id, bank_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_access_request(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_bank, test_service};

    #[tokio::test]
    async fn redeem_unknown_code_creates_nothing() {
        let svc = test_service().await;
        let (student, _) = svc.resolve_messaging_identity("U1").await.unwrap();

        let result = svc.redeem_invite_code(&student, "NOPE").await;
        assert!(matches!(result, Err(DatabaseError::UnknownInviteCode(_))));

        let mut rows = svc
            .db()
            .conn()
            .query("SELECT count(*) FROM access_requests", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 0);
    }

    #[tokio::test]
    async fn open_bank_approves_immediately() {
        let svc = test_service().await;
        let (student, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        let (_, bank) = seed_bank(&svc, false).await;

        let redemption = svc
            .redeem_invite_code(&student, &bank.invite_code)
            .await
            .unwrap();
        assert_eq!(redemption.status, AccessStatus::Approved);
        assert_eq!(redemption.bank_name, "Bio 101");
        assert!(svc.is_authorized(&student, &bank.id).await.unwrap());
    }

    #[tokio::test]
    async fn gated_bank_starts_pending() {
        let svc = test_service().await;
        let (student, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        let (_, bank) = seed_bank(&svc, true).await;

        let redemption = svc
            .redeem_invite_code(&student, &bank.invite_code)
            .await
            .unwrap();
        assert_eq!(redemption.status, AccessStatus::Pending);
        assert!(!svc.is_authorized(&student, &bank.id).await.unwrap());
    }

    #[tokio::test]
    async fn approval_flow_then_terminal() {
        let svc = test_service().await;
        let (student, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        let (_, bank) = seed_bank(&svc, true).await;

        svc.redeem_invite_code(&student, &bank.invite_code)
            .await
            .unwrap();
        let request = svc.get_access_for_pair(&student, &bank.id).await.unwrap();

        let decided = svc.decide_request(&request.id, true).await.unwrap();
        assert_eq!(decided.status, AccessStatus::Approved);
        assert!(svc.is_authorized(&student, &bank.id).await.unwrap());

        // Terminal: a second decision must fail
        let again = svc.decide_request(&request.id, false).await;
        assert!(matches!(
            again,
            Err(DatabaseError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn rejection_denies_access() {
        let svc = test_service().await;
        let (student, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        let (_, bank) = seed_bank(&svc, true).await;

        svc.redeem_invite_code(&student, &bank.invite_code)
            .await
            .unwrap();
        let request = svc.get_access_for_pair(&student, &bank.id).await.unwrap();

        let decided = svc.decide_request(&request.id, false).await.unwrap();
        assert_eq!(decided.status, AccessStatus::Rejected);
        assert!(!svc.is_authorized(&student, &bank.id).await.unwrap());
    }

    #[tokio::test]
    async fn repeat_redemption_is_idempotent() {
        let svc = test_service().await;
        let (student, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        let (_, bank) = seed_bank(&svc, true).await;

        let first = svc
            .redeem_invite_code(&student, &bank.invite_code)
            .await
            .unwrap();
        let second = svc
            .redeem_invite_code(&student, &bank.invite_code)
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut rows = svc
            .db()
            .conn()
            .query("SELECT count(*) FROM access_requests", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn redemption_after_approval_reports_approved() {
        let svc = test_service().await;
        let (student, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        let (_, bank) = seed_bank(&svc, true).await;

        svc.redeem_invite_code(&student, &bank.invite_code)
            .await
            .unwrap();
        let request = svc.get_access_for_pair(&student, &bank.id).await.unwrap();
        svc.decide_request(&request.id, true).await.unwrap();

        let again = svc
            .redeem_invite_code(&student, &bank.invite_code)
            .await
            .unwrap();
        assert_eq!(again.status, AccessStatus::Approved);
    }

    #[tokio::test]
    async fn listing_projects_bank_names_and_statuses() {
        let svc = test_service().await;
        let (student, _) = svc.resolve_messaging_identity("U1").await.unwrap();
        let creator = svc.create_creator("teacher@x.com", "pw").await.unwrap();
        let open_bank = svc.create_bank(&creator.id, "Bio 101", false).await.unwrap();
        let gated_bank = svc
            .create_bank(&creator.id, "Chem 201", true)
            .await
            .unwrap();

        svc.redeem_invite_code(&student, &open_bank.invite_code)
            .await
            .unwrap();
        svc.redeem_invite_code(&student, &gated_bank.invite_code)
            .await
            .unwrap();

        let listing = svc.list_requests_for_student(&student).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert!(listing.contains(&StudentBankAccess {
            bank_name: "Bio 101".into(),
            status: AccessStatus::Approved,
        }));
        assert!(listing.contains(&StudentBankAccess {
            bank_name: "Chem 201".into(),
            status: AccessStatus::Pending,
        }));
    }

    #[tokio::test]
    async fn decide_unknown_request() {
        let svc = test_service().await;
        let result = svc.decide_request("acc-nope", true).await;
        assert!(matches!(result, Err(DatabaseError::NoResult)));
    }
}
