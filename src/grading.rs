//! Local score preview for descriptors that ship answer keys.
//!
//! The grading service stays authoritative; this only powers the result
//! screen.

use crate::models::Quiz;
use crate::submission::SubmissionPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// The question has no answer key.
    Ungraded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeReport {
    pub verdicts: Vec<Verdict>,
    pub correct: usize,
    pub gradable: usize,
    pub percentage: f64,
    /// `None` when the quiz has no passing score or nothing could be graded.
    pub passed: Option<bool>,
}

/// A question is correct when the selected set equals the answer key.
pub fn grade(quiz: &Quiz, payload: &SubmissionPayload) -> GradeReport {
    let verdicts: Vec<Verdict> = quiz
        .questions
        .iter()
        .map(|question| {
            let Some(key) = &question.correct else {
                return Verdict::Ungraded;
            };
            let given = payload
                .answers
                .iter()
                .find(|answered| answered.question_id == question.id);
            match given {
                Some(answered) if &answered.answers == key => Verdict::Correct,
                _ => Verdict::Incorrect,
            }
        })
        .collect();

    let correct = verdicts.iter().filter(|v| **v == Verdict::Correct).count();
    let gradable = verdicts.iter().filter(|v| **v != Verdict::Ungraded).count();
    let percentage = calculate_percentage(correct, gradable);
    let passed = match (quiz.passing_score, gradable) {
        (Some(score), 1..) => Some(percentage >= f64::from(score)),
        _ => None,
    };

    GradeReport {
        verdicts,
        correct,
        gradable,
        percentage,
        passed,
    }
}

fn calculate_percentage(score: usize, total: usize) -> f64 {
    if total > 0 {
        (score as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use super::*;
    use crate::engine::QuizSession;
    use crate::models::{Question, QuestionKind, QuestionOption};

    fn keyed(id: &str, kind: QuestionKind, key: Option<&[&str]>) -> Question {
        Question {
            id: id.to_string(),
            text: id.to_string(),
            code: None,
            kind,
            options: ["a", "b", "c"]
                .into_iter()
                .map(|o| QuestionOption {
                    id: o.to_string(),
                    text: o.to_string(),
                })
                .collect(),
            time_limit_seconds: None,
            correct: key.map(|ids| ids.iter().map(|id| id.to_string()).collect::<BTreeSet<_>>()),
        }
    }

    fn graded_quiz(passing_score: Option<u8>) -> Quiz {
        Quiz {
            id: "graded".to_string(),
            title: "Graded".to_string(),
            description: None,
            time_limit_seconds: None,
            passing_score,
            questions: vec![
                keyed("q1", QuestionKind::SingleChoice, Some(&["b"])),
                keyed("q2", QuestionKind::MultipleChoice, Some(&["a", "c"])),
                keyed("q3", QuestionKind::SingleChoice, None),
            ],
        }
    }

    fn submit(quiz: &Quiz, picks: &[&[&str]]) -> SubmissionPayload {
        let mut session = QuizSession::new(quiz.clone()).unwrap();
        for (index, options) in picks.iter().enumerate() {
            for option in options.iter() {
                session.answer(option);
            }
            if index + 1 < picks.len() {
                session.advance();
            }
        }
        session.submit().unwrap()
    }

    #[test]
    fn test_exact_set_match_is_correct() {
        let quiz = graded_quiz(Some(50));
        let payload = submit(&quiz, &[&["b"], &["a", "c"], &["a"]]);

        let report = grade(&quiz, &payload);
        assert_eq!(
            report.verdicts,
            vec![Verdict::Correct, Verdict::Correct, Verdict::Ungraded]
        );
        assert_eq!(report.correct, 2);
        assert_eq!(report.gradable, 2);
        assert_eq!(report.passed, Some(true));
    }

    #[test]
    fn test_partial_multiple_choice_is_incorrect() {
        let quiz = graded_quiz(Some(70));
        let payload = submit(&quiz, &[&["b"], &["a"], &["a"]]);

        let report = grade(&quiz, &payload);
        assert_eq!(report.verdicts[1], Verdict::Incorrect);
        assert_eq!(report.percentage, 50.0);
        assert_eq!(report.passed, Some(false));
    }

    #[test]
    fn test_no_passing_score_means_no_verdict() {
        let quiz = graded_quiz(None);
        let payload = SubmissionPayload {
            attempt_id: Uuid::new_v4(),
            quiz_id: quiz.id.clone(),
            answers: vec![],
            time_spent_seconds: 0,
        };
        let report = grade(&quiz, &payload);
        assert_eq!(report.correct, 0);
        assert_eq!(report.passed, None);
    }
}
