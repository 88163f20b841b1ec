//! Shared test utilities for ql-db tests.

use ql_core::entities::{Creator, QuestionBank};

use crate::QuizDb;
use crate::service::QuizService;

/// Create an in-memory `QuizService`.
pub(crate) async fn test_service() -> QuizService {
    let db = QuizDb::open_local(":memory:").await.unwrap();
    QuizService::from_db(db)
}

/// Create a creator and a bank, returning both (convenience for access and
/// answer-log tests that need a redeemable bank).
pub(crate) async fn seed_bank(svc: &QuizService, requires_approval: bool) -> (Creator, QuestionBank) {
    let creator = svc.create_creator("teacher@x.com", "pw").await.unwrap();
    let bank = svc
        .create_bank(&creator.id, "Bio 101", requires_approval)
        .await
        .unwrap();
    (creator, bank)
}
