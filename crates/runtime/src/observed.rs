//! Auto-observed processor decorator
//!
//! Wraps a raw processor with a tracing span per invocation, message
//! counters, latency observation, and error-tag bookkeeping. The wrapper
//! is transparent to the processor contract; part-level processors are
//! additionally adapted to the batch contract here.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use sluice_message::{Batch, Part};

use crate::error::ComponentError;
use crate::metrics::{ProcessorMetrics, ProcessorMetricsHandle};
use crate::processor::{BatchProcessor, Processor};

/// Observed wrapper around a batch-level processor.
pub struct ObservedBatch {
    name: String,
    inner: Box<dyn BatchProcessor>,
    metrics: Arc<ProcessorMetrics>,
}

impl ObservedBatch {
    pub fn new(name: impl Into<String>, inner: Box<dyn BatchProcessor>) -> Self {
        Self {
            name: name.into(),
            inner,
            metrics: Arc::new(ProcessorMetrics::new()),
        }
    }

    pub fn metrics_handle(&self) -> ProcessorMetricsHandle {
        ProcessorMetricsHandle::new(self.name.clone(), Arc::clone(&self.metrics))
    }
}

#[async_trait]
impl BatchProcessor for ObservedBatch {
    async fn process_batch(
        &self,
        ctx: &CancellationToken,
        batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError> {
        let span = tracing::debug_span!("processor", name = %self.name);
        self.metrics.record_received(batch.len() as u64);
        let started = Instant::now();

        let result = self.inner.process_batch(ctx, batch).instrument(span).await;
        self.metrics.record_latency(started.elapsed());

        match &result {
            Ok(batches) => {
                let mut sent = 0u64;
                let mut errored = 0u64;
                for batch in batches {
                    sent += batch.len() as u64;
                    errored += batch.iter().filter(|p| p.is_errored()).count() as u64;
                }
                self.metrics.record_sent(sent);
                self.metrics.record_part_errors(errored);
            }
            Err(err) => {
                self.metrics.record_batch_failure();
                tracing::debug!(name = %self.name, error = %err, "processor failed batch");
            }
        }
        result
    }

    async fn close(&self) -> Result<(), ComponentError> {
        self.inner.close().await
    }
}

/// Observed wrapper adapting a part-level processor to the batch contract.
///
/// A part-level error marks the failed part's error tag and keeps it in the
/// output (the non-fatal failure channel); cancellation stays fatal for the
/// whole invocation.
pub struct ObservedParts {
    name: String,
    inner: Box<dyn Processor>,
    metrics: Arc<ProcessorMetrics>,
}

impl ObservedParts {
    pub fn new(name: impl Into<String>, inner: Box<dyn Processor>) -> Self {
        Self {
            name: name.into(),
            inner,
            metrics: Arc::new(ProcessorMetrics::new()),
        }
    }

    pub fn metrics_handle(&self) -> ProcessorMetricsHandle {
        ProcessorMetricsHandle::new(self.name.clone(), Arc::clone(&self.metrics))
    }

    async fn run_parts(
        &self,
        ctx: &CancellationToken,
        batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError> {
        let mut out = Vec::with_capacity(batch.len());
        for part in batch {
            match self.inner.process(ctx, part.clone()).await {
                Ok(parts) => out.extend(parts),
                Err(ComponentError::Cancelled) => return Err(ComponentError::Cancelled),
                Err(err) => {
                    self.metrics.record_part_errors(1);
                    tracing::debug!(name = %self.name, error = %err, "processor failed part");
                    let mut failed = part;
                    failed.set_error(err);
                    out.push(failed);
                }
            }
        }
        if out.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Batch::new(out)])
    }
}

#[async_trait]
impl BatchProcessor for ObservedParts {
    async fn process_batch(
        &self,
        ctx: &CancellationToken,
        batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError> {
        let span = tracing::debug_span!("processor", name = %self.name);
        self.metrics.record_received(batch.len() as u64);
        let started = Instant::now();

        let result = self.run_parts(ctx, batch).instrument(span).await;
        self.metrics.record_latency(started.elapsed());

        match &result {
            Ok(batches) => {
                let sent: u64 = batches.iter().map(|b| b.len() as u64).sum();
                self.metrics.record_sent(sent);
            }
            Err(err) => {
                self.metrics.record_batch_failure();
                tracing::debug!(name = %self.name, error = %err, "processor failed batch");
            }
        }
        result
    }

    async fn close(&self) -> Result<(), ComponentError> {
        self.inner.close().await
    }
}

#[cfg(test)]
#[path = "observed_test.rs"]
mod tests;
