use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::question::{Question, QuestionKind};

/// A quiz descriptor as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Quiz-wide limit in seconds. Zero means no limit.
    #[serde(default)]
    pub time_limit_seconds: Option<u64>,
    /// Percentage (0..=100) needed to pass.
    #[serde(default)]
    pub passing_score: Option<u8>,
    pub questions: Vec<Question>,
}

/// Reasons a quiz descriptor is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("quiz must contain at least one question")]
    NoQuestions,
    #[error("duplicate question id '{0}'")]
    DuplicateQuestion(String),
    #[error("question '{0}' has no options")]
    NoOptions(String),
    #[error("question '{question}' has duplicate option id '{option}'")]
    DuplicateOption { question: String, option: String },
    #[error("question '{question}' marks unknown option '{option}' as correct")]
    UnknownCorrectOption { question: String, option: String },
    #[error("single-choice question '{0}' has more than one correct option")]
    AmbiguousSingleChoice(String),
    #[error("passing score {0} is above 100")]
    PassingScoreOutOfRange(u8),
}

impl Quiz {
    /// Quiz-wide limit, treating zero as unlimited.
    pub fn time_limit(&self) -> Option<u64> {
        self.time_limit_seconds.filter(|limit| *limit > 0)
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// True when every question carries an answer key.
    pub fn is_gradable(&self) -> bool {
        self.questions.iter().all(|q| q.correct.is_some())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.questions.is_empty() {
            return Err(ValidationError::NoQuestions);
        }

        if let Some(score) = self.passing_score {
            if score > 100 {
                return Err(ValidationError::PassingScoreOutOfRange(score));
            }
        }

        let mut question_ids = HashSet::new();
        for question in &self.questions {
            if !question_ids.insert(question.id.as_str()) {
                return Err(ValidationError::DuplicateQuestion(question.id.clone()));
            }
            validate_question(question)?;
        }

        Ok(())
    }
}

fn validate_question(question: &Question) -> Result<(), ValidationError> {
    if question.options.is_empty() {
        return Err(ValidationError::NoOptions(question.id.clone()));
    }

    let mut option_ids = BTreeSet::new();
    for option in &question.options {
        if !option_ids.insert(option.id.as_str()) {
            return Err(ValidationError::DuplicateOption {
                question: question.id.clone(),
                option: option.id.clone(),
            });
        }
    }

    let Some(correct) = &question.correct else {
        return Ok(());
    };

    if let Some(unknown) = correct.iter().find(|id| !option_ids.contains(id.as_str())) {
        return Err(ValidationError::UnknownCorrectOption {
            question: question.id.clone(),
            option: unknown.clone(),
        });
    }

    if question.kind == QuestionKind::SingleChoice && correct.len() > 1 {
        return Err(ValidationError::AmbiguousSingleChoice(question.id.clone()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionOption;

    fn question(id: &str, kind: QuestionKind, options: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {id}"),
            code: None,
            kind,
            options: options
                .iter()
                .map(|o| QuestionOption {
                    id: o.to_string(),
                    text: o.to_uppercase(),
                })
                .collect(),
            time_limit_seconds: None,
            correct: None,
        }
    }

    fn quiz(questions: Vec<Question>) -> Quiz {
        Quiz {
            id: "quiz".to_string(),
            title: "Quiz".to_string(),
            description: None,
            time_limit_seconds: None,
            passing_score: None,
            questions,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_quiz() {
        let quiz = quiz(vec![
            question("q1", QuestionKind::SingleChoice, &["a", "b"]),
            question("q2", QuestionKind::MultipleChoice, &["a", "b", "c"]),
        ]);
        assert_eq!(quiz.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_empty_quiz() {
        assert_eq!(quiz(vec![]).validate(), Err(ValidationError::NoQuestions));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let dup_question = quiz(vec![
            question("q1", QuestionKind::SingleChoice, &["a"]),
            question("q1", QuestionKind::SingleChoice, &["a"]),
        ]);
        assert_eq!(
            dup_question.validate(),
            Err(ValidationError::DuplicateQuestion("q1".to_string()))
        );

        let dup_option = quiz(vec![question("q1", QuestionKind::SingleChoice, &["a", "a"])]);
        assert!(matches!(
            dup_option.validate(),
            Err(ValidationError::DuplicateOption { .. })
        ));
    }

    #[test]
    fn test_validate_checks_answer_keys() {
        let mut q = question("q1", QuestionKind::SingleChoice, &["a", "b"]);
        q.correct = Some(BTreeSet::from(["z".to_string()]));
        assert!(matches!(
            quiz(vec![q.clone()]).validate(),
            Err(ValidationError::UnknownCorrectOption { .. })
        ));

        q.correct = Some(BTreeSet::from(["a".to_string(), "b".to_string()]));
        assert_eq!(
            quiz(vec![q]).validate(),
            Err(ValidationError::AmbiguousSingleChoice("q1".to_string()))
        );
    }

    #[test]
    fn test_zero_time_limit_means_unlimited() {
        let mut quiz = quiz(vec![question("q1", QuestionKind::SingleChoice, &["a"])]);
        quiz.time_limit_seconds = Some(0);
        assert_eq!(quiz.time_limit(), None);
        quiz.time_limit_seconds = Some(90);
        assert_eq!(quiz.time_limit(), Some(90));
    }
}
