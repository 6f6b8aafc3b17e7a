//! Quiz session engine: the state machine, its tickers and the runner that
//! ties them together.

mod runner;
mod session;
mod timer;

pub use runner::{Delivery, QuizRunner, RunnerError, TimerEvent, TimerKind, Update};
pub use session::{
    QuestionTick, QuizSession, QuizTick, SessionError, SessionSnapshot, SessionStatus,
    SubmitRejected,
};
pub use timer::Ticker;
