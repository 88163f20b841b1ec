//! Append-only answer log.
//!
//! Downstream consumers (analytics, creator dashboards) read this table;
//! the core only ever appends. Foreign-key validity is the single
//! invariant.

use chrono::Utc;

use ql_core::entities::AnswerLog;
use ql_core::ids::PREFIX_ANSWER;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, parse_datetime};
use crate::service::QuizService;

const SELECT_COLS: &str = "id, student_id, bank_id, question_key, was_correct, created_at";

fn row_to_answer_log(row: &libsql::Row) -> Result<AnswerLog, DatabaseError> {
    Ok(AnswerLog {
        id: row.get(0)?,
        student_id: row.get(1)?,
        bank_id: row.get(2)?,
        question_key: row.get(3)?,
        was_correct: get_bool(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl QuizService {
    /// Append one answered question to the log.
    pub async fn log_answer(
        &self,
        student_id: &str,
        bank_id: &str,
        question_key: &str,
        was_correct: bool,
    ) -> Result<AnswerLog, DatabaseError> {
        let id = self.db().generate_id(PREFIX_ANSWER).await?;
        let now = Utc::now();

        self.db()
            .conn()
            .execute(
                "INSERT INTO answer_logs \
                 (id, student_id, bank_id, question_key, was_correct, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    id.as_str(),
                    student_id,
                    bank_id,
                    question_key,
                    i64::from(was_correct),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(AnswerLog {
            id,
            student_id: student_id.to_string(),
            bank_id: bank_id.to_string(),
            question_key: question_key.to_string(),
            was_correct,
            created_at: now,
        })
    }

    /// List a student's logged answers, oldest first.
    pub async fn list_answers_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<AnswerLog>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM answer_logs \
                     WHERE student_id = ?1 ORDER BY created_at"
                ),
                [student_id],
            )
            .await?;

        let mut logs = Vec::new();
        while let Some(row) = rows.next().await? {
            logs.push(row_to_answer_log(&row)?);
        }
        Ok(logs)
    }
}
