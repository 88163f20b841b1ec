//! Entity structs for all quizlink domain objects.

mod access_request;
mod answer_log;
mod bank;
mod creator;
mod student;

pub use access_request::AccessRequest;
pub use answer_log::AnswerLog;
pub use bank::QuestionBank;
pub use creator::Creator;
pub use student::Student;
