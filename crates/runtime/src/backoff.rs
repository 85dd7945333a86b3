//! Exponential backoff with an elapsed-time budget

use std::time::{Duration, Instant};

use serde::Deserialize;

#[cfg(test)]
#[path = "backoff_test.rs"]
mod tests;

const MULTIPLIER: u32 = 2;

/// Declarative backoff policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffConfig {
    /// First sleep interval.
    #[serde(with = "humantime_serde")]
    pub initial_interval: Duration,

    /// Cap applied to the doubling interval.
    #[serde(with = "humantime_serde")]
    pub max_interval: Duration,

    /// Total budget across sleeps. Zero disables the budget entirely.
    #[serde(with = "humantime_serde")]
    pub max_elapsed_time: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            max_elapsed_time: Duration::from_secs(60),
        }
    }
}

/// Backoff state for one run of retries.
///
/// Each run starts from a fresh copy of the configured policy; the clock
/// for the elapsed budget starts at the first `next` call.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current: Duration,
    started: Option<Instant>,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        let current = config.initial_interval;
        Self {
            config,
            current,
            started: None,
        }
    }

    /// Restart the run: interval and elapsed budget reset.
    pub fn reset(&mut self) {
        self.current = self.config.initial_interval;
        self.started = None;
    }

    /// The next sleep interval, or `None` once the elapsed budget is
    /// exhausted.
    pub fn next(&mut self) -> Option<Duration> {
        let started = *self.started.get_or_insert_with(Instant::now);
        if !self.config.max_elapsed_time.is_zero()
            && started.elapsed() >= self.config.max_elapsed_time
        {
            return None;
        }
        let interval = self.current;
        self.current = (self.current * MULTIPLIER).min(self.config.max_interval);
        Some(interval)
    }
}

impl From<BackoffConfig> for Backoff {
    fn from(config: BackoffConfig) -> Self {
        Self::new(config)
    }
}
