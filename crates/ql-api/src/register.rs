//! Registration/bind API handling.
//!
//! The registration page posts `{email, password, line_user_id}`; the
//! handler runs the identity reconciliation engine and maps each failure
//! kind to a distinct HTTP-style status code so the caller can tell
//! retryable from non-retryable outcomes.

use serde::{Deserialize, Serialize};
use serde_json::json;

use ql_db::error::DatabaseError;
use ql_db::service::QuizService;

/// The JSON body the registration page submits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RegisterBindRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub line_user_id: String,
}

/// HTTP-style response handed back to the serving collaborator.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

/// Map an engine failure to its response status code.
///
/// 400 — malformed input, no retry; 409 — business-rule or uniqueness
/// conflict, retry only with different input; 404 — unknown resource;
/// 500 — infrastructure fault.
const fn status_for(e: &DatabaseError) -> u16 {
    match e {
        DatabaseError::Validation(_) => 400,
        DatabaseError::IdentityConflict(_)
        | DatabaseError::Uniqueness(_)
        | DatabaseError::InvalidTransition { .. } => 409,
        DatabaseError::UnknownInviteCode(_) | DatabaseError::NoResult => 404,
        DatabaseError::Query(_)
        | DatabaseError::Migration(_)
        | DatabaseError::LibSql(_)
        | DatabaseError::Other(_) => 500,
    }
}

/// Handle one registration/bind request.
///
/// Success is 201 with the student ID; every failure kind maps to a
/// distinct status code via [`status_for`].
pub async fn handle_register_bind(svc: &QuizService, req: &RegisterBindRequest) -> ApiResponse {
    match svc
        .register_or_bind(&req.email, &req.password, &req.line_user_id)
        .await
    {
        Ok(student_id) => ApiResponse {
            status: 201,
            body: json!({
                "status": "success",
                "message": "account registered and linked",
                "student_id": student_id,
            }),
        },
        Err(e) => {
            let status = status_for(&e);
            if status == 500 {
                tracing::error!(error = %e, "register/bind failed");
            }
            ApiResponse::error(status, e.to_string())
        }
    }
}
