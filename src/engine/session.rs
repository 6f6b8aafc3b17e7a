//! The quiz session state machine.
//!
//! ```text
//! Active --(time limit reached)--> TimeUp --(submit)--> Submitted
//!    |                               |
//!    +----------(cancel)-------------+----------------> Cancelled
//! ```
//!
//! `QuizSession` is synchronous and owns no timers. The runner feeds it
//! ticks; every transition that is not allowed in the current state is a
//! silent no-op.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Question, QuestionKind, Quiz};
use crate::submission::{AnsweredQuestion, SubmissionPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Submitted,
    Cancelled,
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// Active, but at least one time limit has been reached.
    TimeUp,
    Submitted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizTick {
    Ignored,
    Counted(u64),
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionTick {
    Ignored,
    Counted(u64),
    /// The current question ran out of time; `advanced` tells whether the
    /// session moved on to the next question.
    TimeUp { advanced: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a quiz session needs at least one question")]
    EmptyQuiz,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("attempt was already submitted")]
    AlreadySubmitted,
    #[error("attempt was cancelled")]
    Cancelled,
    #[error("{} question(s) still unanswered", .missing.len())]
    Incomplete { missing: Vec<usize> },
}

/// Read-only copy of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub quiz_id: String,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub answers: BTreeMap<usize, BTreeSet<String>>,
    pub quiz_elapsed_seconds: u64,
    pub question_elapsed_seconds: u64,
    pub quiz_time_up: bool,
    pub question_time_up: bool,
    pub status: SessionStatus,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    current_question_index: usize,
    answers: BTreeMap<usize, BTreeSet<String>>,
    quiz_elapsed_seconds: u64,
    question_elapsed_seconds: u64,
    quiz_time_up: bool,
    question_time_up: bool,
    phase: Phase,
}

impl QuizSession {
    pub fn new(quiz: Quiz) -> Result<Self, SessionError> {
        if quiz.questions.is_empty() {
            return Err(SessionError::EmptyQuiz);
        }

        Ok(Self {
            quiz,
            current_question_index: 0,
            answers: BTreeMap::new(),
            quiz_elapsed_seconds: 0,
            question_elapsed_seconds: 0,
            quiz_time_up: false,
            question_time_up: false,
            phase: Phase::Active,
        })
    }

    /// Start over with a different quiz.
    pub fn reset(&mut self, quiz: Quiz) -> Result<(), SessionError> {
        *self = Self::new(quiz)?;
        Ok(())
    }

    /// Start over with the same quiz.
    pub fn restart(&mut self) {
        self.current_question_index = 0;
        self.answers.clear();
        self.quiz_elapsed_seconds = 0;
        self.question_elapsed_seconds = 0;
        self.quiz_time_up = false;
        self.question_time_up = false;
        self.phase = Phase::Active;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz.id
    }

    pub fn questions(&self) -> &[Question] {
        &self.quiz.questions
    }

    pub fn total_questions(&self) -> usize {
        self.quiz.questions.len()
    }

    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    pub fn current_question(&self) -> &Question {
        &self.quiz.questions[self.current_question_index]
    }

    pub fn is_first_question(&self) -> bool {
        self.current_question_index == 0
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 == self.total_questions()
    }

    pub fn answers(&self) -> &BTreeMap<usize, BTreeSet<String>> {
        &self.answers
    }

    /// `None` when the learner has not touched this question yet.
    pub fn answers_for(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.answers.get(&index)
    }

    pub fn is_selected(&self, index: usize, option_id: &str) -> bool {
        self.answers
            .get(&index)
            .is_some_and(|set| set.contains(option_id))
    }

    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|set| !set.is_empty()).count()
    }

    pub fn quiz_elapsed_seconds(&self) -> u64 {
        self.quiz_elapsed_seconds
    }

    pub fn question_elapsed_seconds(&self) -> u64 {
        self.question_elapsed_seconds
    }

    pub fn quiz_time_up(&self) -> bool {
        self.quiz_time_up
    }

    pub fn question_time_up(&self) -> bool {
        self.question_time_up
    }

    pub fn quiz_remaining_seconds(&self) -> Option<u64> {
        self.quiz
            .time_limit()
            .map(|limit| limit.saturating_sub(self.quiz_elapsed_seconds))
    }

    pub fn question_remaining_seconds(&self) -> Option<u64> {
        self.current_question()
            .time_limit()
            .map(|limit| limit.saturating_sub(self.question_elapsed_seconds))
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn is_submitted(&self) -> bool {
        self.phase == Phase::Submitted
    }

    pub fn status(&self) -> SessionStatus {
        match self.phase {
            Phase::Submitted => SessionStatus::Submitted,
            Phase::Cancelled => SessionStatus::Cancelled,
            Phase::Active if self.quiz_time_up || self.question_time_up => SessionStatus::TimeUp,
            Phase::Active => SessionStatus::Active,
        }
    }

    /// Indices of questions without a non-empty answer.
    pub fn unanswered(&self) -> Vec<usize> {
        (0..self.total_questions())
            .filter(|index| self.answers.get(index).is_none_or(|set| set.is_empty()))
            .collect()
    }

    pub fn can_submit(&self) -> bool {
        self.is_active() && self.unanswered().is_empty()
    }

    /// The question timer only runs while the current question has a limit
    /// that has not been reached.
    pub fn question_timer_armed(&self) -> bool {
        self.is_active() && !self.question_time_up && self.current_question().time_limit().is_some()
    }

    pub fn quiz_timer_armed(&self) -> bool {
        self.is_active() && !self.quiz_time_up
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            quiz_id: self.quiz.id.clone(),
            current_question_index: self.current_question_index,
            total_questions: self.total_questions(),
            answers: self.answers.clone(),
            quiz_elapsed_seconds: self.quiz_elapsed_seconds,
            question_elapsed_seconds: self.question_elapsed_seconds,
            quiz_time_up: self.quiz_time_up,
            question_time_up: self.question_time_up,
            status: self.status(),
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    pub fn tick_quiz(&mut self) -> QuizTick {
        if !self.quiz_timer_armed() {
            return QuizTick::Ignored;
        }

        self.quiz_elapsed_seconds += 1;
        match self.quiz.time_limit() {
            Some(limit) if self.quiz_elapsed_seconds >= limit => {
                self.quiz_elapsed_seconds = limit;
                self.quiz_time_up = true;
                QuizTick::TimeUp
            }
            _ => QuizTick::Counted(self.quiz_elapsed_seconds),
        }
    }

    pub fn tick_question(&mut self) -> QuestionTick {
        if !self.question_timer_armed() {
            return QuestionTick::Ignored;
        }
        let Some(limit) = self.current_question().time_limit() else {
            return QuestionTick::Ignored;
        };

        self.question_elapsed_seconds += 1;
        if self.question_elapsed_seconds < limit {
            return QuestionTick::Counted(self.question_elapsed_seconds);
        }

        self.question_elapsed_seconds = limit;
        self.question_time_up = true;
        let advanced = self.advance();
        QuestionTick::TimeUp { advanced }
    }

    /// Select an option of the current question.
    ///
    /// Single-choice questions keep only the latest selection; multiple-choice
    /// questions toggle it. Returns false when nothing changed.
    pub fn answer(&mut self, option_id: &str) -> bool {
        if !self.is_active() {
            return false;
        }

        let question = &self.quiz.questions[self.current_question_index];
        if !question.has_option(option_id) {
            return false;
        }

        let selected = self.answers.entry(self.current_question_index).or_default();
        match question.kind {
            QuestionKind::SingleChoice => {
                selected.clear();
                selected.insert(option_id.to_string());
            }
            QuestionKind::MultipleChoice => {
                if !selected.remove(option_id) {
                    selected.insert(option_id.to_string());
                }
            }
        }
        true
    }

    pub fn advance(&mut self) -> bool {
        if !self.is_active() || self.is_last_question() {
            return false;
        }

        self.current_question_index += 1;
        self.question_elapsed_seconds = 0;
        self.question_time_up = false;
        true
    }

    /// Go back one question. An exhausted question timer is not rearmed.
    pub fn retreat(&mut self) -> bool {
        if !self.is_active() || self.is_first_question() {
            return false;
        }

        self.current_question_index -= 1;
        self.question_elapsed_seconds = 0;
        true
    }

    pub fn submit(&mut self) -> Result<SubmissionPayload, SubmitRejected> {
        match self.phase {
            Phase::Submitted => return Err(SubmitRejected::AlreadySubmitted),
            Phase::Cancelled => return Err(SubmitRejected::Cancelled),
            Phase::Active => {}
        }

        let missing = self.unanswered();
        if !missing.is_empty() {
            return Err(SubmitRejected::Incomplete { missing });
        }

        self.phase = Phase::Submitted;

        let time_spent_seconds = match self.quiz.time_limit() {
            Some(limit) => self.quiz_elapsed_seconds.min(limit),
            None => self.quiz_elapsed_seconds,
        };
        let answers = self
            .quiz
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| AnsweredQuestion {
                question_id: question.id.clone(),
                answers: self.answers.get(&index).cloned().unwrap_or_default(),
            })
            .collect();

        Ok(SubmissionPayload {
            attempt_id: Uuid::new_v4(),
            quiz_id: self.quiz.id.clone(),
            answers,
            time_spent_seconds,
        })
    }

    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.phase = Phase::Cancelled;
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::QuestionOption;

    pub(crate) fn question(id: &str, kind: QuestionKind, limit: Option<u64>) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {id}"),
            code: None,
            kind,
            options: ["a", "b", "c"]
                .into_iter()
                .map(|o| QuestionOption {
                    id: o.to_string(),
                    text: o.to_uppercase(),
                })
                .collect(),
            time_limit_seconds: limit,
            correct: None,
        }
    }

    pub(crate) fn quiz(id: &str, limit: Option<u64>, questions: Vec<Question>) -> Quiz {
        Quiz {
            id: id.to_string(),
            title: format!("Quiz {id}"),
            description: None,
            time_limit_seconds: limit,
            passing_score: None,
            questions,
        }
    }

    /// Two questions, quiz limit 120s, 10s on the first question only.
    pub(crate) fn two_question_quiz() -> Quiz {
        quiz(
            "two",
            Some(120),
            vec![
                question("q1", QuestionKind::SingleChoice, Some(10)),
                question("q2", QuestionKind::MultipleChoice, None),
            ],
        )
    }

    fn tick(session: &mut QuizSession, seconds: u64) {
        for _ in 0..seconds {
            session.tick_quiz();
            session.tick_question();
        }
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_empty_quiz_is_rejected() {
        let err = QuizSession::new(quiz("empty", None, vec![])).unwrap_err();
        assert_eq!(err, SessionError::EmptyQuiz);
    }

    #[test]
    fn test_reset_on_quiz_change() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        session.answer("a");
        tick(&mut session, 12);
        session.answer("b");
        assert_eq!(session.current_question_index(), 1);

        session
            .reset(quiz(
                "other",
                Some(60),
                vec![question("x1", QuestionKind::SingleChoice, Some(5))],
            ))
            .unwrap();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.quiz_id, "other");
        assert_eq!(snapshot.current_question_index, 0);
        assert!(snapshot.answers.is_empty());
        assert_eq!(snapshot.quiz_elapsed_seconds, 0);
        assert_eq!(snapshot.question_elapsed_seconds, 0);
        assert!(!snapshot.quiz_time_up);
        assert!(!snapshot.question_time_up);
        assert_eq!(snapshot.status, SessionStatus::Active);
    }

    #[test]
    fn test_restart_after_submit_reopens_session() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        session.answer("a");
        session.advance();
        session.answer("b");
        session.submit().unwrap();

        session.restart();
        assert!(session.is_active());
        assert!(session.answers().is_empty());
        assert_eq!(session.current_question_index(), 0);
    }

    #[test]
    fn test_single_choice_replaces_selection() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        assert!(session.answer("a"));
        assert!(session.answer("b"));
        assert_eq!(session.answers_for(0), Some(&set(&["b"])));
    }

    #[test]
    fn test_multiple_choice_toggles_selection() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        session.advance();

        session.answer("a");
        session.answer("b");
        assert_eq!(session.answers_for(1), Some(&set(&["a", "b"])));

        session.answer("b");
        assert_eq!(session.answers_for(1), Some(&set(&["a"])));
    }

    #[test]
    fn test_unknown_option_is_ignored() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        assert!(!session.answer("zz"));
        assert_eq!(session.answers_for(0), None);
    }

    #[test]
    fn test_untouched_question_has_no_entry() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        session.advance();
        session.answer("a");
        session.answer("a");

        assert_eq!(session.answers_for(0), None);
        assert_eq!(session.answers_for(1), Some(&BTreeSet::new()));
        assert_eq!(session.unanswered(), vec![0, 1]);
    }

    #[test]
    fn test_advance_and_retreat_bounds() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        assert!(!session.retreat());
        assert!(session.advance());
        assert!(!session.advance());
        assert_eq!(session.current_question_index(), 1);
        assert!(session.retreat());
        assert_eq!(session.current_question_index(), 0);
    }

    #[test]
    fn test_question_timer_resets_on_advance() {
        let mut session = QuizSession::new(quiz(
            "limits",
            None,
            vec![
                question("q1", QuestionKind::SingleChoice, Some(30)),
                question("q2", QuestionKind::SingleChoice, Some(30)),
            ],
        ))
        .unwrap();
        tick(&mut session, 20);
        assert_eq!(session.question_elapsed_seconds(), 20);

        assert!(session.advance());
        assert_eq!(session.question_elapsed_seconds(), 0);
        assert!(!session.question_time_up());
        assert_eq!(session.question_remaining_seconds(), Some(30));
    }

    #[test]
    fn test_question_time_up_on_last_question_stays_put() {
        let mut session = QuizSession::new(quiz(
            "last",
            None,
            vec![
                question("q1", QuestionKind::SingleChoice, None),
                question("q2", QuestionKind::SingleChoice, Some(3)),
            ],
        ))
        .unwrap();
        session.advance();

        assert_eq!(session.tick_question(), QuestionTick::Counted(1));
        assert_eq!(session.tick_question(), QuestionTick::Counted(2));
        assert_eq!(session.tick_question(), QuestionTick::TimeUp { advanced: false });
        assert!(session.question_time_up());
        assert_eq!(session.question_elapsed_seconds(), 3);
        assert_eq!(session.tick_question(), QuestionTick::Ignored);
        assert_eq!(session.status(), SessionStatus::TimeUp);
    }

    #[test]
    fn test_retreat_keeps_question_time_up() {
        let mut session = QuizSession::new(quiz(
            "retreat",
            None,
            vec![
                question("q1", QuestionKind::SingleChoice, Some(5)),
                question("q2", QuestionKind::SingleChoice, Some(2)),
            ],
        ))
        .unwrap();
        session.advance();
        session.tick_question();
        session.tick_question();
        assert!(session.question_time_up());

        assert!(session.retreat());
        assert_eq!(session.current_question_index(), 0);
        assert_eq!(session.question_elapsed_seconds(), 0);
        assert!(session.question_time_up());
        assert!(!session.question_timer_armed());
    }

    #[test]
    fn test_question_without_limit_never_times_out() {
        let mut session = QuizSession::new(quiz(
            "open",
            None,
            vec![question("q1", QuestionKind::SingleChoice, None)],
        ))
        .unwrap();
        for _ in 0..500 {
            assert_eq!(session.tick_question(), QuestionTick::Ignored);
        }
        assert_eq!(session.question_elapsed_seconds(), 0);
        assert!(!session.question_time_up());
    }

    #[test]
    fn test_quiz_time_up_freezes_without_submitting() {
        let mut session = QuizSession::new(quiz(
            "short",
            Some(3),
            vec![question("q1", QuestionKind::SingleChoice, None)],
        ))
        .unwrap();
        assert_eq!(session.tick_quiz(), QuizTick::Counted(1));
        assert_eq!(session.tick_quiz(), QuizTick::Counted(2));
        assert_eq!(session.tick_quiz(), QuizTick::TimeUp);
        assert_eq!(session.tick_quiz(), QuizTick::Ignored);

        assert_eq!(session.quiz_elapsed_seconds(), 3);
        assert_eq!(session.quiz_remaining_seconds(), Some(0));
        assert_eq!(session.status(), SessionStatus::TimeUp);
        assert!(!session.is_submitted());

        // Answering and submitting are still allowed.
        assert!(session.answer("a"));
        assert_eq!(session.submit().unwrap().time_spent_seconds, 3);
    }

    #[test]
    fn test_submit_rejects_incomplete_answers() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        session.answer("a");
        let before = session.snapshot();

        assert!(!session.can_submit());
        assert_eq!(
            session.submit(),
            Err(SubmitRejected::Incomplete { missing: vec![1] })
        );
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_submit_once() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        session.answer("a");
        session.advance();
        session.answer("c");
        assert!(session.can_submit());

        let payload = session.submit().unwrap();
        assert_eq!(payload.quiz_id, "two");
        assert_eq!(session.submit(), Err(SubmitRejected::AlreadySubmitted));
        assert!(!session.can_submit());
    }

    #[test]
    fn test_nothing_moves_after_submit() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        session.answer("a");
        session.advance();
        session.answer("c");
        session.submit().unwrap();
        let frozen = session.snapshot();

        tick(&mut session, 5);
        assert!(!session.answer("b"));
        assert!(!session.retreat());
        assert!(!session.cancel());
        assert_eq!(session.snapshot(), frozen);
    }

    #[test]
    fn test_cancel_is_terminal_and_idempotent() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        assert!(session.cancel());
        assert!(!session.cancel());
        assert_eq!(session.status(), SessionStatus::Cancelled);
        assert_eq!(session.tick_quiz(), QuizTick::Ignored);
        assert_eq!(session.submit(), Err(SubmitRejected::Cancelled));
    }

    #[test]
    fn test_end_to_end_two_question_scenario() {
        let mut session = QuizSession::new(two_question_quiz()).unwrap();
        session.answer("b");

        tick(&mut session, 10);
        assert_eq!(session.current_question_index(), 1);
        assert_eq!(session.question_elapsed_seconds(), 0);
        assert!(!session.question_time_up());
        assert_eq!(session.quiz_elapsed_seconds(), 10);

        tick(&mut session, 20);
        assert_eq!(session.quiz_elapsed_seconds(), 30);
        assert!(!session.question_time_up());

        session.answer("a");
        session.answer("c");
        let payload = session.submit().unwrap();
        assert_eq!(payload.time_spent_seconds, 30);
        assert_eq!(payload.answers.len(), 2);
        assert_eq!(payload.answers[0].question_id, "q1");
        assert_eq!(payload.answers[0].answers, set(&["b"]));
        assert_eq!(payload.answers[1].question_id, "q2");
        assert_eq!(payload.answers[1].answers, set(&["a", "c"]));
        assert!(session.is_submitted());

        tick(&mut session, 5);
        assert_eq!(session.quiz_elapsed_seconds(), 30);
    }
}
