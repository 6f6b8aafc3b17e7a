//! Drives a [`QuizSession`] with two live tickers.
//!
//! The runner is the only owner of the session. Ticker tasks never touch
//! session state; they post [`TimerEvent`]s on a channel and the runner
//! applies them on its own task, after checking that the event comes from
//! the ticker's current run.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::models::Quiz;
use crate::submission::{AttemptSink, SinkError, SubmissionPayload};

use super::session::{QuestionTick, QuizSession, QuizTick, SessionError, SubmitRejected};
use super::timer::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Quiz,
    Question,
}

/// A tick posted by a ticker task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub timer: TimerKind,
    pub generation: u64,
}

/// What a processed tick changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    QuizTicked { elapsed: u64 },
    QuizTimeUp,
    QuestionTicked { elapsed: u64 },
    /// The question's time ran out. `advanced_to` is the new question index
    /// when the session moved on.
    QuestionTimeUp { advanced_to: Option<usize> },
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("submission rejected: {0}")]
    Rejected(#[from] SubmitRejected),
    #[error("submission could not be delivered: {0}")]
    Delivery(#[source] SinkError),
    #[error("there is no undelivered submission")]
    NothingToRedeliver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Delivered,
    Failed,
}

pub struct QuizRunner {
    session: QuizSession,
    quiz_timer: Ticker,
    question_timer: Ticker,
    events_tx: mpsc::UnboundedSender<TimerEvent>,
    events_rx: mpsc::UnboundedReceiver<TimerEvent>,
    submitted: Option<(SubmissionPayload, Delivery)>,
}

impl QuizRunner {
    /// Build a session for `quiz` and start its timers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(quiz: Quiz, config: &RunnerConfig) -> Result<Self, RunnerError> {
        let session = QuizSession::new(quiz)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut runner = Self {
            session,
            quiz_timer: Ticker::new(config.tick_period),
            question_timer: Ticker::new(config.tick_period),
            events_tx,
            events_rx,
            submitted: None,
        };
        info!(quiz_id = %runner.session.quiz_id(), "quiz session mounted");
        runner.start_timers();
        Ok(runner)
    }

    /// Switch to `quiz`. Re-initializes only when the quiz id changes;
    /// returns whether it did.
    pub fn load(&mut self, quiz: Quiz) -> Result<bool, RunnerError> {
        if quiz.id == self.session.quiz_id() {
            return Ok(false);
        }

        self.stop_timers();
        self.session.reset(quiz)?;
        self.submitted = None;
        info!(quiz_id = %self.session.quiz_id(), "quiz session reinitialized");
        self.start_timers();
        Ok(true)
    }

    /// Start a fresh attempt at the same quiz.
    pub fn restart(&mut self) {
        self.stop_timers();
        self.session.restart();
        self.submitted = None;
        info!(quiz_id = %self.session.quiz_id(), "quiz session restarted");
        self.start_timers();
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn quiz_timer_running(&self) -> bool {
        self.quiz_timer.is_running()
    }

    pub fn question_timer_running(&self) -> bool {
        self.question_timer.is_running()
    }

    pub fn submission(&self) -> Option<&SubmissionPayload> {
        self.submitted.as_ref().map(|(payload, _)| payload)
    }

    pub fn delivery(&self) -> Option<Delivery> {
        self.submitted.as_ref().map(|(_, delivery)| *delivery)
    }

    // ── Timer plumbing ───────────────────────────────────────────────

    fn start_timers(&mut self) {
        self.sync_quiz_timer();
        self.sync_question_timer();
    }

    fn stop_timers(&mut self) {
        self.quiz_timer.stop();
        self.question_timer.stop();
    }

    fn sync_quiz_timer(&mut self) {
        if !self.session.quiz_timer_armed() {
            self.quiz_timer.stop();
        } else if !self.quiz_timer.is_running() {
            let tx = self.events_tx.clone();
            self.quiz_timer.start(move |generation| {
                let _ = tx.send(TimerEvent {
                    timer: TimerKind::Quiz,
                    generation,
                });
            });
        }
    }

    /// (Re)start the question timer for the current question.
    fn sync_question_timer(&mut self) {
        self.question_timer.stop();
        if self.session.question_timer_armed() {
            let tx = self.events_tx.clone();
            self.question_timer.start(move |generation| {
                let _ = tx.send(TimerEvent {
                    timer: TimerKind::Question,
                    generation,
                });
            });
        }
    }

    /// Wait for the next tick that changes the session.
    ///
    /// Returns `None` once no timer is left running.
    pub async fn next_update(&mut self) -> Option<Update> {
        while self.quiz_timer.is_running() || self.question_timer.is_running() {
            let event = self.events_rx.recv().await?;
            if let Some(update) = self.apply(event) {
                return Some(update);
            }
        }
        None
    }

    /// Apply every tick that has already been posted.
    pub fn drain(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            updates.extend(self.apply(event));
        }
        updates
    }

    /// Apply one tick. Ticks from a stopped or superseded run are dropped.
    pub fn apply(&mut self, event: TimerEvent) -> Option<Update> {
        match event.timer {
            TimerKind::Quiz => {
                if !self.quiz_timer.is_current(event.generation) {
                    debug!(generation = event.generation, "dropping stale quiz tick");
                    return None;
                }
                match self.session.tick_quiz() {
                    QuizTick::Ignored => None,
                    QuizTick::Counted(elapsed) => Some(Update::QuizTicked { elapsed }),
                    QuizTick::TimeUp => {
                        info!(quiz_id = %self.session.quiz_id(), "quiz time is up");
                        self.quiz_timer.stop();
                        Some(Update::QuizTimeUp)
                    }
                }
            }
            TimerKind::Question => {
                if !self.question_timer.is_current(event.generation) {
                    debug!(generation = event.generation, "dropping stale question tick");
                    return None;
                }
                match self.session.tick_question() {
                    QuestionTick::Ignored => None,
                    QuestionTick::Counted(elapsed) => Some(Update::QuestionTicked { elapsed }),
                    QuestionTick::TimeUp { advanced } => {
                        let index = self.session.current_question_index();
                        info!(index, advanced, "question time is up");
                        self.sync_question_timer();
                        Some(Update::QuestionTimeUp {
                            advanced_to: advanced.then_some(index),
                        })
                    }
                }
            }
        }
    }

    // ── Learner actions ──────────────────────────────────────────────

    pub fn answer(&mut self, option_id: &str) -> bool {
        self.session.answer(option_id)
    }

    pub fn advance(&mut self) -> bool {
        let moved = self.session.advance();
        if moved {
            self.sync_question_timer();
        }
        moved
    }

    pub fn retreat(&mut self) -> bool {
        let moved = self.session.retreat();
        if moved {
            self.sync_question_timer();
        }
        moved
    }

    /// Freeze the session and hand the payload to `sink`.
    ///
    /// Timers are stopped before the sink is called. A delivery failure
    /// leaves the session submitted; use [`QuizRunner::redeliver`] to retry.
    pub async fn submit<S: AttemptSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<SubmissionPayload, RunnerError> {
        let payload = self.session.submit()?;
        self.stop_timers();
        info!(
            quiz_id = %payload.quiz_id,
            attempt_id = %payload.attempt_id,
            time_spent_seconds = payload.time_spent_seconds,
            "quiz submitted"
        );

        self.submitted = Some((payload.clone(), Delivery::Pending));
        self.deliver(sink).await?;
        Ok(payload)
    }

    /// Send the already frozen payload again after a failed delivery.
    pub async fn redeliver<S: AttemptSink>(&mut self, sink: &mut S) -> Result<(), RunnerError> {
        match self.delivery() {
            Some(Delivery::Failed) => self.deliver(sink).await,
            _ => Err(RunnerError::NothingToRedeliver),
        }
    }

    async fn deliver<S: AttemptSink>(&mut self, sink: &mut S) -> Result<(), RunnerError> {
        let Some((payload, delivery)) = self.submitted.as_mut() else {
            return Err(RunnerError::NothingToRedeliver);
        };

        match sink.submit(payload).await {
            Ok(()) => {
                *delivery = Delivery::Delivered;
                Ok(())
            }
            Err(err) => {
                warn!(attempt_id = %payload.attempt_id, error = %err, "submission delivery failed");
                *delivery = Delivery::Failed;
                Err(RunnerError::Delivery(err))
            }
        }
    }

    /// Leave without submitting. Returns false when the session had already
    /// ended.
    pub fn cancel<S: AttemptSink>(&mut self, sink: &mut S) -> bool {
        if !self.session.cancel() {
            return false;
        }
        self.stop_timers();
        info!(quiz_id = %self.session.quiz_id(), "quiz cancelled");
        sink.cancelled();
        true
    }
}
