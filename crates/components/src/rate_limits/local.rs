//! Local rate limit
//!
//! Admits a fixed number of calls per interval, local to this process.
//! When the budget for the current interval is spent, callers are told
//! the residual wait until the next refresh.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;

use sluice_runtime::{ComponentError, RateLimit};

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;

/// Configuration for the local rate limit.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocalRateLimitConfig {
    /// Admissions per interval.
    pub count: usize,

    /// Refresh interval.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for LocalRateLimitConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            interval: Duration::from_secs(1),
        }
    }
}

/// Process-local count-per-interval throttle.
pub struct LocalRateLimit {
    size: usize,
    period: Duration,
    remaining: usize,
    last_refresh: Instant,
}

impl LocalRateLimit {
    pub fn new(config: LocalRateLimitConfig) -> Result<Self, String> {
        if config.count == 0 {
            return Err("count must be larger than zero".to_string());
        }
        if config.interval.is_zero() {
            return Err("interval must be non-zero".to_string());
        }
        Ok(Self {
            size: config.count,
            period: config.interval,
            remaining: config.count,
            last_refresh: Instant::now(),
        })
    }
}

#[async_trait]
impl RateLimit for LocalRateLimit {
    async fn access(&mut self) -> Result<Duration, ComponentError> {
        if self.remaining == 0 {
            let since = self.last_refresh.elapsed();
            if since < self.period {
                return Ok(self.period - since);
            }
            self.remaining = self.size;
            self.last_refresh = Instant::now();
        }
        self.remaining -= 1;
        Ok(Duration::ZERO)
    }
}
