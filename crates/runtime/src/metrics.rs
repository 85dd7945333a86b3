//! Per-processor counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters maintained by the observed processor wrapper.
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    parts_received: AtomicU64,
    parts_sent: AtomicU64,
    part_errors: AtomicU64,
    batch_failures: AtomicU64,
    latency_ns: AtomicU64,
}

impl ProcessorMetrics {
    pub const fn new() -> Self {
        Self {
            parts_received: AtomicU64::new(0),
            parts_sent: AtomicU64::new(0),
            part_errors: AtomicU64::new(0),
            batch_failures: AtomicU64::new(0),
            latency_ns: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self, parts: u64) {
        self.parts_received.fetch_add(parts, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sent(&self, parts: u64) {
        self.parts_sent.fetch_add(parts, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_part_errors(&self, parts: u64) {
        self.part_errors.fetch_add(parts, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch_failure(&self) {
        self.batch_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_latency(&self, elapsed: Duration) {
        self.latency_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProcessorSnapshot {
        ProcessorSnapshot {
            parts_received: self.parts_received.load(Ordering::Relaxed),
            parts_sent: self.parts_sent.load(Ordering::Relaxed),
            part_errors: self.part_errors.load(Ordering::Relaxed),
            batch_failures: self.batch_failures.load(Ordering::Relaxed),
            latency: Duration::from_nanos(self.latency_ns.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time snapshot of processor counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorSnapshot {
    pub parts_received: u64,
    pub parts_sent: u64,
    pub part_errors: u64,
    pub batch_failures: u64,
    pub latency: Duration,
}

/// Handle for reading a processor's counters externally.
///
/// Remains valid after the processor has been consumed by the pipeline.
#[derive(Clone)]
pub struct ProcessorMetricsHandle {
    label: String,
    metrics: Arc<ProcessorMetrics>,
}

impl ProcessorMetricsHandle {
    pub(crate) fn new(label: String, metrics: Arc<ProcessorMetrics>) -> Self {
        Self { label, metrics }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn snapshot(&self) -> ProcessorSnapshot {
        self.metrics.snapshot()
    }
}
