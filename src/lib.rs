//! # quiz-runner
//!
//! Timed quiz sessions for the terminal.
//!
//! The core is [`engine::QuizSession`], a synchronous state machine for one
//! attempt at one quiz, driven by [`engine::QuizRunner`] which owns the
//! quiz-wide and per-question tickers. The terminal front end is a thin
//! shell around the runner.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quiz_runner::{JsonFileSink, Quiz, QuizError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QuizError> {
//!     let quiz = Quiz::from_json("quiz.json", JsonFileSink::new("submission.json"))?;
//!     quiz.run().await
//! }
//! ```

mod app;
pub mod config;
mod data;
pub mod engine;
pub mod grading;
pub mod models;
pub mod submission;
pub mod terminal;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use thiserror::Error;
use tracing::info;

pub use app::App;
pub use config::RunnerConfig;
pub use data::{LoadError, load_quiz_from_json, parse_quiz};
pub use engine::{QuizRunner, QuizSession, RunnerError};
pub use models::{AppState, Question, QuestionKind, QuestionOption, ValidationError};
pub use submission::{AttemptSink, JsonFileSink, SinkError, SubmissionPayload};

/// How long the event loop waits for a key before applying timer ticks.
const INPUT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("failed to load quiz: {0}")]
    Load(#[from] LoadError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("quiz session error: {0}")]
    Runner(#[from] RunnerError),
}

/// A quiz ready to be taken in the terminal.
pub struct Quiz<S: AttemptSink> {
    app: App<S>,
}

impl<S: AttemptSink> Quiz<S> {
    pub fn new(quiz: models::Quiz, sink: S) -> Self {
        Self::with_config(quiz, sink, RunnerConfig::default())
    }

    pub fn with_config(quiz: models::Quiz, sink: S, config: RunnerConfig) -> Self {
        Self {
            app: App::new(quiz, sink, config),
        }
    }

    /// Load a quiz descriptor from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P, sink: S) -> Result<Self, QuizError> {
        let quiz = load_quiz_from_json(path)?;
        Ok(Self::new(quiz, sink))
    }

    /// Take over the terminal until the learner quits.
    ///
    /// Must be awaited inside a tokio runtime.
    pub async fn run(mut self) -> Result<(), QuizError> {
        let mut term = terminal::TerminalGuard::acquire()?;
        let result = run_event_loop(&mut term, &mut self.app).await;
        drop(term);
        result
    }

    pub fn app(&self) -> &App<S> {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App<S> {
        &mut self.app
    }
}

async fn run_event_loop<S: AttemptSink>(
    terminal: &mut terminal::AppTerminal,
    app: &mut App<S>,
) -> Result<(), QuizError> {
    loop {
        app.pump_timers();
        terminal.draw(|frame| ui::render(frame, app))?;

        if !event::poll(INPUT_POLL)? {
            tokio::task::yield_now().await;
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if handle_input(app, key.code).await? {
                break;
            }
        }
    }

    Ok(())
}

/// Returns true if the app should exit.
async fn handle_input<S: AttemptSink>(app: &mut App<S>, key: KeyCode) -> Result<bool, QuizError> {
    let quit = match app.state {
        AppState::Welcome => handle_welcome_input(app, key)?,
        AppState::Quiz => handle_quiz_input(app, key).await,
        AppState::Result => handle_result_input(app, key).await,
    };
    Ok(quit)
}

fn handle_welcome_input<S: AttemptSink>(app: &mut App<S>, key: KeyCode) -> Result<bool, QuizError> {
    match key {
        KeyCode::Enter => {
            app.start_quiz()?;
            Ok(false)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Ok(true),
        _ => Ok(false),
    }
}

async fn handle_quiz_input<S: AttemptSink>(app: &mut App<S>, key: KeyCode) -> bool {
    match key {
        KeyCode::Up | KeyCode::Char('k') => app.select_previous_option(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_option(),
        KeyCode::Enter | KeyCode::Char(' ') => app.choose_option(),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => app.next_question(),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('p') => app.previous_question(),
        KeyCode::Char('s') | KeyCode::Char('S') => {
            app.submit().await;
        }
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            info!("learner left the quiz");
            app.cancel();
            return true;
        }
        _ => {}
    }
    false
}

async fn handle_result_input<S: AttemptSink>(app: &mut App<S>, key: KeyCode) -> bool {
    match key {
        KeyCode::Down | KeyCode::Char('j') => app.scroll_results_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_results_up(),
        KeyCode::Char('d') | KeyCode::Char('D') => app.redeliver().await,
        KeyCode::Char('r') | KeyCode::Char('R') => app.restart(),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return true,
        _ => {}
    }
    false
}
