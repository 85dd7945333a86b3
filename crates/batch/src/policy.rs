//! Batch policy - count/size/time/condition aggregation

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;

use sluice_message::{Batch, Part};

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;

/// Predicate evaluated against the accumulated parts after each add.
///
/// Compiled from the policy's `check` expression by the engine's mapper
/// runtime; the policy itself treats it as opaque.
pub trait BatchCondition: Send + Sync {
    fn test(&self, parts: &[Part]) -> bool;
}

/// Declarative batching policy.
///
/// Any subset of triggers may be enabled. With none enabled the policy is
/// a noop and the engine skips the aggregator entirely.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchPolicyConfig {
    /// Flush once this many parts have been added.
    pub count: Option<usize>,

    /// Flush once the accumulated payload bytes reach this size.
    pub byte_size: Option<usize>,

    /// Flush on a timer, e.g. "100ms" or "5s".
    #[serde(with = "humantime_serde::option")]
    pub period: Option<Duration>,

    /// Expression evaluated after each add; truth flushes.
    pub check: Option<String>,
}

impl BatchPolicyConfig {
    /// Whether no trigger is configured.
    pub fn is_noop(&self) -> bool {
        self.count.is_none()
            && self.byte_size.is_none()
            && self.period.is_none()
            && self.check.is_none()
    }
}

/// Stateful aggregator of parts into batches.
///
/// Not safe for concurrent use - the owning loop serializes calls.
pub struct BatchPolicy {
    count: Option<usize>,
    byte_size: Option<usize>,
    period: Option<Duration>,
    check: Option<Arc<dyn BatchCondition>>,

    parts: Vec<Part>,
    current_bytes: usize,
    last_flush: Instant,
}

impl BatchPolicy {
    /// Build a policy from its configuration and an optional compiled
    /// check predicate.
    pub fn new(config: &BatchPolicyConfig, check: Option<Arc<dyn BatchCondition>>) -> Self {
        Self {
            count: config.count,
            byte_size: config.byte_size,
            period: config.period,
            check,
            parts: Vec::new(),
            current_bytes: 0,
            last_flush: Instant::now(),
        }
    }

    /// Append a part. Returns true when the accumulated batch should be
    /// flushed now.
    pub fn add(&mut self, part: Part) -> bool {
        self.current_bytes += part.byte_size();
        self.parts.push(part);

        if let Some(count) = self.count {
            if self.parts.len() >= count {
                return true;
            }
        }
        if let Some(byte_size) = self.byte_size {
            if self.current_bytes >= byte_size {
                return true;
            }
        }
        if let Some(check) = &self.check {
            if check.test(&self.parts) {
                return true;
            }
        }
        false
    }

    /// Remaining time until the period timer fires.
    ///
    /// `None` when no period is configured; zero when already due.
    pub fn until_next(&self) -> Option<Duration> {
        let period = self.period?;
        Some(period.saturating_sub(self.last_flush.elapsed()))
    }

    /// Return the accumulated batch and reset all triggers, including the
    /// period timer. `None` when nothing has accumulated.
    pub fn flush(&mut self) -> Option<Batch> {
        self.last_flush = Instant::now();
        if self.parts.is_empty() {
            return None;
        }
        self.current_bytes = 0;
        Some(Batch::new(std::mem::take(&mut self.parts)))
    }

    /// Number of accumulated parts.
    #[inline]
    pub fn count(&self) -> usize {
        self.parts.len()
    }

    /// Accumulated payload bytes.
    #[inline]
    pub fn accumulated_bytes(&self) -> usize {
        self.current_bytes
    }
}

impl std::fmt::Debug for BatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPolicy")
            .field("count", &self.count)
            .field("byte_size", &self.byte_size)
            .field("period", &self.period)
            .field("buffered", &self.parts.len())
            .finish()
    }
}
