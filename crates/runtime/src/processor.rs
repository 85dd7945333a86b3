//! Processor contracts
//!
//! A processor is a unit operation over a part or a batch. Returning an
//! empty batch list means the batch is fully dropped; returning parts
//! carrying error tags is the non-fatal failure channel; returning an
//! error is fatal for the whole transaction.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sluice_message::{Batch, Part};

use crate::error::ComponentError;

/// Unit operation over a single part.
///
/// Implementations are concurrency-safe with respect to instance reuse:
/// the engine may invoke them for distinct batches concurrently.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Process one part, yielding zero or more parts.
    async fn process(
        &self,
        ctx: &CancellationToken,
        part: Part,
    ) -> Result<Vec<Part>, ComponentError>;

    /// Release resources held by the processor.
    async fn close(&self) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Unit operation over a whole batch.
#[async_trait]
pub trait BatchProcessor: Send + Sync {
    /// Process one batch, yielding zero or more batches.
    async fn process_batch(
        &self,
        ctx: &CancellationToken,
        batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError>;

    /// Release resources held by the processor.
    async fn close(&self) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Run a processor list over a set of batches.
///
/// Each processor consumes every batch produced by the previous one. A
/// batch dropped by one processor (empty result) simply disappears from
/// the stream; a fatal error aborts the whole run.
pub async fn execute_all(
    ctx: &CancellationToken,
    processors: &[Arc<dyn BatchProcessor>],
    mut batches: Vec<Batch>,
) -> Result<Vec<Batch>, ComponentError> {
    for processor in processors {
        let mut next = Vec::with_capacity(batches.len());
        for batch in batches {
            if batch.is_empty() {
                continue;
            }
            let produced = processor.process_batch(ctx, batch).await?;
            next.extend(produced.into_iter().filter(|b| !b.is_empty()));
        }
        batches = next;
        if batches.is_empty() {
            break;
        }
    }
    Ok(batches)
}
