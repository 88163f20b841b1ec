//! Repository modules implementing the engine operations.
//!
//! Each module adds methods to `QuizService` via `impl QuizService` blocks:
//! - `identity` — the identity reconciliation engine
//! - `access` — the access control engine
//! - `bank` — creator and question-bank administration
//! - `answer_log` — the append-only answer log

pub mod access;
pub mod answer_log;
pub mod bank;
pub mod identity;
