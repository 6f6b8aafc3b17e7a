use std::time::Duration;

/// Tick granularity of both session timers.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Default file the bundled sink writes submissions to.
pub const DEFAULT_OUTPUT_PATH: &str = "submission.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    pub tick_period: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
        }
    }
}
