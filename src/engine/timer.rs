//! Cancelable periodic ticker.
//!
//! A [`Ticker`] is an owned resource: `start` acquires a background tokio
//! task, `stop` (or dropping the ticker) releases it. Every run carries a
//! generation number so that consumers can tell ticks of the current run
//! apart from ticks of a superseded one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Handle to one running interval task.
struct TickerRun {
    alive: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct Ticker {
    period: Duration,
    generation: u64,
    run: Option<TickerRun>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            run: None,
        }
    }

    /// Start ticking, replacing any previous run.
    ///
    /// `on_tick` receives the generation of the run that produced the tick.
    /// The first tick fires one full period after `start`. Must be called
    /// from within a tokio runtime.
    pub fn start<F>(&mut self, mut on_tick: F) -> u64
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.stop();
        self.generation += 1;

        let generation = self.generation;
        let alive = Arc::new(AtomicBool::new(true));
        let task_alive = Arc::clone(&alive);
        let period = self.period;
        let first_tick = Instant::now() + period;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(first_tick, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !task_alive.load(Ordering::Acquire) {
                    break;
                }
                on_tick(generation);
            }
        });

        self.run = Some(TickerRun { alive, handle });
        generation
    }

    /// Stop ticking. Safe to call repeatedly or before `start`.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            run.alive.store(false, Ordering::Release);
            run.handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a tick tagged with `generation` belongs to the live run.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_running() && self.generation == generation
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
