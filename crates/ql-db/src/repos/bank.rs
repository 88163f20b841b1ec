//! Creator and question-bank administration.
//!
//! Creators exist as the foreign-key target for question banks; the
//! creator-facing surface lives outside this core, but the store must be
//! populatable. Invite codes are issued once and never change.

use chrono::Utc;

use ql_core::entities::{Creator, QuestionBank};
use ql_core::ids::{PREFIX_BANK, PREFIX_CREATOR};

use crate::error::DatabaseError;
use crate::helpers::{get_bool, parse_datetime};
use crate::repos::identity::hash_password;
use crate::service::QuizService;

const BANK_COLS: &str = "id, creator_id, name, invite_code, requires_approval, created_at";

// 16M possible codes; a collision is rare, exhausting the retries rarer still.
const INVITE_CODE_ATTEMPTS: u32 = 5;

fn row_to_bank(row: &libsql::Row) -> Result<QuestionBank, DatabaseError> {
    Ok(QuestionBank {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        name: row.get(2)?,
        invite_code: row.get(3)?,
        requires_approval: get_bool(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl QuizService {
    /// Create a creator account.
    ///
    /// # Errors
    ///
    /// `Uniqueness` when the email is already registered.
    pub async fn create_creator(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Creator, DatabaseError> {
        if email.is_empty() || password.is_empty() {
            return Err(DatabaseError::Validation(
                "email and password are required".into(),
            ));
        }

        let id = self.db().generate_id(PREFIX_CREATOR).await?;
        let now = Utc::now();
        let password_hash = hash_password(password).await?;

        self.db()
            .conn()
            .execute(
                "INSERT INTO creators (id, email, password_hash, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    id.as_str(),
                    email,
                    password_hash.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await
            .map_err(DatabaseError::from_constraint)?;

        Ok(Creator {
            id,
            email: email.to_string(),
            password_hash,
            created_at: now,
        })
    }

    /// Create a question bank owned by `creator_id`, issuing its invite
    /// code. An issued code that collides with an existing bank is
    /// regenerated and retried.
    pub async fn create_bank(
        &self,
        creator_id: &str,
        name: &str,
        requires_approval: bool,
    ) -> Result<QuestionBank, DatabaseError> {
        if name.is_empty() {
            return Err(DatabaseError::Validation("bank name is required".into()));
        }

        for attempt in 0..INVITE_CODE_ATTEMPTS {
            let invite_code = self.generate_invite_code().await?;
            match self
                .insert_bank(creator_id, name, requires_approval, &invite_code)
                .await
            {
                Err(DatabaseError::Uniqueness(msg)) if msg.contains("invite_code") => {
                    tracing::debug!(attempt, "invite code collision, regenerating");
                }
                other => return other,
            }
        }
        Err(DatabaseError::Query(
            "could not issue a unique invite code".into(),
        ))
    }

    async fn insert_bank(
        &self,
        creator_id: &str,
        name: &str,
        requires_approval: bool,
        invite_code: &str,
    ) -> Result<QuestionBank, DatabaseError> {
        let id = self.db().generate_id(PREFIX_BANK).await?;
        let now = Utc::now();

        self.db()
            .conn()
            .execute(
                "INSERT INTO question_banks \
                 (id, creator_id, name, invite_code, requires_approval, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    id.as_str(),
                    creator_id,
                    name,
                    invite_code,
                    i64::from(requires_approval),
                    now.to_rfc3339()
                ],
            )
            .await
            .map_err(DatabaseError::from_constraint)?;

        Ok(QuestionBank {
            id,
            creator_id: creator_id.to_string(),
            name: name.to_string(),
            invite_code: invite_code.to_string(),
            requires_approval,
            created_at: now,
        })
    }

    /// Look up a bank by its invite code. Returns `None` when no bank
    /// matches.
    pub async fn find_bank_by_invite_code(
        &self,
        code: &str,
    ) -> Result<Option<QuestionBank>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {BANK_COLS} FROM question_banks WHERE invite_code = ?1"),
                [code],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_bank(&row)?)),
            None => Ok(None),
        }
    }

    /// Fetch a bank by ID.
    pub async fn get_bank(&self, id: &str) -> Result<QuestionBank, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {BANK_COLS} FROM question_banks WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_bank(&row)
    }

    /// Issue a 6-char uppercase hex invite code via libsql.
    async fn generate_invite_code(&self) -> Result<String, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT upper(hex(randomblob(3)))", ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}
