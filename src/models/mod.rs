mod question;
mod quiz;

pub use question::{Question, QuestionKind, QuestionOption};
pub use quiz::{Quiz, ValidationError};

/// Screen the presentation shell is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Welcome,
    Quiz,
    Result,
}
