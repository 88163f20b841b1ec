//! ID prefix constants.
//!
//! All entity IDs are `"{prefix}-{8 hex chars}"`, generated in SQL via
//! `randomblob(4)` (see `QuizDb::generate_id` in ql-db).

pub const PREFIX_STUDENT: &str = "stu";
pub const PREFIX_CREATOR: &str = "crt";
pub const PREFIX_BANK: &str = "bnk";
pub const PREFIX_ACCESS: &str = "acc";
pub const PREFIX_ANSWER: &str = "ans";

/// All prefixes, for exhaustive ID-format tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_STUDENT,
    PREFIX_CREATOR,
    PREFIX_BANK,
    PREFIX_ACCESS,
    PREFIX_ANSWER,
];
