pub mod orchestrator;
pub mod parse;
pub mod prompt;

pub use orchestrator::{QaRequest, answer_question};
pub use parse::QaResult;
