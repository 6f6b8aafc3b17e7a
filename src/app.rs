use std::time::{Duration, Instant};

use tracing::warn;

use crate::config::RunnerConfig;
use crate::engine::{Delivery, QuizRunner, QuizSession, RunnerError, Update};
use crate::grading::{GradeReport, grade};
use crate::models::{AppState, Quiz};
use crate::submission::AttemptSink;

const NOTICE_DURATION: Duration = Duration::from_secs(3);

struct Notice {
    message: String,
    shown_at: Instant,
}

/// Presentation state around one quiz runner.
pub struct App<S: AttemptSink> {
    pub state: AppState,
    quiz: Quiz,
    config: RunnerConfig,
    runner: Option<QuizRunner>,
    sink: S,
    cursor: usize,
    notice: Option<Notice>,
    result_scroll: usize,
    grade: Option<GradeReport>,
    delivery_error: Option<String>,
}

impl<S: AttemptSink> App<S> {
    pub fn new(quiz: Quiz, sink: S, config: RunnerConfig) -> Self {
        Self {
            state: AppState::Welcome,
            quiz,
            config,
            runner: None,
            sink,
            cursor: 0,
            notice: None,
            result_scroll: 0,
            grade: None,
            delivery_error: None,
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn runner(&self) -> Option<&QuizRunner> {
        self.runner.as_ref()
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.runner.as_ref().map(QuizRunner::session)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| notice.shown_at.elapsed() < NOTICE_DURATION)
            .map(|notice| notice.message.as_str())
    }

    pub fn result_scroll(&self) -> usize {
        self.result_scroll
    }

    pub fn grade(&self) -> Option<&GradeReport> {
        self.grade.as_ref()
    }

    pub fn delivery(&self) -> Option<Delivery> {
        self.runner.as_ref().and_then(QuizRunner::delivery)
    }

    pub fn delivery_error(&self) -> Option<&str> {
        self.delivery_error.as_deref()
    }

    pub fn can_submit(&self) -> bool {
        self.session().is_some_and(QuizSession::can_submit)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Mount a session, or start a fresh attempt on the mounted one.
    pub fn start_quiz(&mut self) -> Result<(), RunnerError> {
        match self.runner.as_mut() {
            Some(runner) => runner.restart(),
            None => self.runner = Some(QuizRunner::mount(self.quiz.clone(), &self.config)?),
        }
        self.cursor = 0;
        self.notice = None;
        self.result_scroll = 0;
        self.grade = None;
        self.delivery_error = None;
        self.state = AppState::Quiz;
        Ok(())
    }

    /// Apply pending timer ticks.
    pub fn pump_timers(&mut self) {
        let Some(runner) = self.runner.as_mut() else {
            return;
        };

        for update in runner.drain() {
            match update {
                Update::QuestionTimeUp { advanced_to } => {
                    let message = match advanced_to {
                        Some(index) => format!("Time is up! Moved on to question {}.", index + 1),
                        None => "Time is up for this question.".to_string(),
                    };
                    self.notice = Some(Notice {
                        message,
                        shown_at: Instant::now(),
                    });
                    if advanced_to.is_some() {
                        self.cursor = 0;
                    }
                }
                Update::QuizTimeUp => {
                    self.notice = Some(Notice {
                        message: "Quiz time is up. You can still submit.".to_string(),
                        shown_at: Instant::now(),
                    });
                }
                Update::QuizTicked { .. } | Update::QuestionTicked { .. } => {}
            }
        }
    }

    // ── Quiz controls ────────────────────────────────────────────────

    fn option_count(&self) -> usize {
        self.session()
            .map(|session| session.current_question().options.len())
            .unwrap_or(0)
    }

    pub fn select_next_option(&mut self) {
        let count = self.option_count();
        if count > 0 {
            self.cursor = (self.cursor + 1) % count;
        }
    }

    pub fn select_previous_option(&mut self) {
        let count = self.option_count();
        if count > 0 {
            self.cursor = (self.cursor + count - 1) % count;
        }
    }

    /// Select (or toggle) the option under the cursor.
    pub fn choose_option(&mut self) {
        let Some(runner) = self.runner.as_mut() else {
            return;
        };
        let option_id = runner
            .session()
            .current_question()
            .options
            .get(self.cursor)
            .map(|option| option.id.clone());
        if let Some(option_id) = option_id {
            runner.answer(&option_id);
        }
    }

    pub fn next_question(&mut self) {
        if self.runner.as_mut().is_some_and(QuizRunner::advance) {
            self.cursor = 0;
        }
    }

    pub fn previous_question(&mut self) {
        if self.runner.as_mut().is_some_and(QuizRunner::retreat) {
            self.cursor = 0;
        }
    }

    /// Submit when every question is answered. Returns whether the quiz
    /// moved to the result screen.
    pub async fn submit(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }
        let Some(runner) = self.runner.as_mut() else {
            return false;
        };

        match runner.submit(&mut self.sink).await {
            Ok(_) => self.delivery_error = None,
            Err(RunnerError::Delivery(err)) => self.delivery_error = Some(err.to_string()),
            Err(err) => {
                warn!(error = %err, "submit rejected");
                return false;
            }
        }

        self.grade = runner
            .submission()
            .filter(|_| self.quiz.questions.iter().any(|q| q.correct.is_some()))
            .map(|payload| grade(&self.quiz, payload));
        self.result_scroll = 0;
        self.state = AppState::Result;
        true
    }

    /// Retry a failed delivery.
    pub async fn redeliver(&mut self) {
        let Some(runner) = self.runner.as_mut() else {
            return;
        };
        match runner.redeliver(&mut self.sink).await {
            Ok(()) => self.delivery_error = None,
            Err(RunnerError::Delivery(err)) => self.delivery_error = Some(err.to_string()),
            Err(_) => {}
        }
    }

    /// Leave the quiz without submitting.
    pub fn cancel(&mut self) {
        if let Some(runner) = self.runner.as_mut() {
            runner.cancel(&mut self.sink);
        }
    }

    pub fn restart(&mut self) {
        self.state = AppState::Welcome;
        self.cursor = 0;
        self.notice = None;
        self.result_scroll = 0;
    }

    // ── Result screen ────────────────────────────────────────────────

    pub fn scroll_results_down(&mut self) {
        let max_scroll = self.quiz.total_questions().saturating_sub(1);
        self.result_scroll = (self.result_scroll + 1).min(max_scroll);
    }

    pub fn scroll_results_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }
}
