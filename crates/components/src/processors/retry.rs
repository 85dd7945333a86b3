//! Retry processor
//!
//! Executes a list of child processors against each input part in
//! isolation, repeating on any error-tagged output until success or
//! budget exhaustion. Mutations performed by the children during a failed
//! attempt are discarded - every retry sees the part as it first entered
//! the processor. Any error already associated with an incoming part is
//! cleared first, so upstream failures cannot cause permanent loops.
//!
//! Each emitted part is stamped with `retry_count` and `backoff_duration`
//! (milliseconds) metadata.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use sluice_config::ComponentConfig;
use sluice_message::{Batch, Part};
use sluice_runtime::{execute_all, Backoff, BackoffConfig, BatchProcessor, ComponentError};

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;

/// Configuration for the retry processor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Backoff applied between attempts; a fresh copy per part.
    pub backoff: BackoffConfig,

    /// Child processors executed on each message.
    pub processors: Vec<ComponentConfig>,

    /// Process the parts of a batch concurrently instead of serially.
    pub parallel: bool,

    /// Maximum retry attempts; zero retries without bound.
    pub max_retries: u32,
}

/// Retries a child processor chain per part.
pub struct RetryProcessor {
    children: Vec<Arc<dyn BatchProcessor>>,
    backoff: BackoffConfig,
    parallel: bool,
    max_retries: u32,
}

impl RetryProcessor {
    pub fn new(
        children: Vec<Arc<dyn BatchProcessor>>,
        backoff: BackoffConfig,
        parallel: bool,
        max_retries: u32,
    ) -> Self {
        Self {
            children,
            backoff,
            parallel,
            max_retries,
        }
    }

    async fn dispatch_part(
        &self,
        ctx: &CancellationToken,
        mut part: Part,
    ) -> Result<Vec<Batch>, ComponentError> {
        let mut backoff = Backoff::new(self.backoff.clone());
        backoff.reset();

        let mut retries: u32 = 0;
        let mut backoff_duration = Duration::ZERO;

        part.clear_error();

        loop {
            let attempt = Batch::new(vec![part.clone()]);
            let mut batches = execute_all(ctx, &self.children, vec![attempt]).await?;

            let has_failed = batches.iter().any(Batch::has_errored_part);
            if !has_failed {
                stamp_outputs(&mut batches, retries, backoff_duration);
                return Ok(batches);
            }

            retries += 1;
            if self.max_retries > 0 && retries >= self.max_retries {
                tracing::debug!(retries, "maximum number of retries reached");
                stamp_outputs(&mut batches, retries, backoff_duration);
                return Ok(batches);
            }

            let Some(next_sleep) = backoff.next() else {
                tracing::debug!(retries, "maximum retry wait period reached");
                stamp_outputs(&mut batches, retries, backoff_duration);
                return Ok(batches);
            };
            backoff_duration += next_sleep;

            tracing::debug!(backoff = ?next_sleep, "message errored, sleeping until next attempt");
            tokio::select! {
                _ = tokio::time::sleep(next_sleep) => {}
                _ = ctx.cancelled() => return Err(ComponentError::Cancelled),
            }
        }
    }
}

#[async_trait]
impl BatchProcessor for RetryProcessor {
    async fn process_batch(
        &self,
        ctx: &CancellationToken,
        batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError> {
        let mut parts: Vec<Part> = Vec::with_capacity(batch.len());

        if self.parallel {
            let attempts: Vec<_> = batch
                .into_iter()
                .map(|part| self.dispatch_part(ctx, part))
                .collect();
            let results = join_all(attempts).await;
            if ctx.is_cancelled() {
                return Err(ComponentError::Cancelled);
            }
            for result in results {
                if let Ok(batches) = result {
                    parts.extend(batches.into_iter().flatten());
                }
            }
        } else {
            for part in batch {
                let batches = self.dispatch_part(ctx, part).await?;
                parts.extend(batches.into_iter().flatten());
            }
        }

        if parts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Batch::new(parts)])
    }

    async fn close(&self) -> Result<(), ComponentError> {
        for child in &self.children {
            child.close().await?;
        }
        Ok(())
    }
}

fn stamp_outputs(batches: &mut [Batch], retries: u32, backoff_duration: Duration) {
    for batch in batches {
        for part in batch.iter_mut() {
            part.meta_set("retry_count", retries);
            part.meta_set("backoff_duration", backoff_duration.as_millis() as u64);
        }
    }
}
