//! Sync-response processor
//!
//! Stamps the batch in its current state as the synchronous response to
//! the input source. Most inputs ignore the mechanism entirely, in which
//! case the stamp is dropped without penalty.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sluice_message::{set_as_response, Batch};
use sluice_runtime::{BatchProcessor, ComponentError};

#[cfg(test)]
#[path = "sync_response_test.rs"]
mod tests;

/// Stamps batches into the transaction's response store.
pub struct SyncResponseProcessor;

#[async_trait]
impl BatchProcessor for SyncResponseProcessor {
    async fn process_batch(
        &self,
        _ctx: &CancellationToken,
        batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError> {
        if let Err(err) = set_as_response(&batch) {
            tracing::debug!(error = %err, "failed to store message as a sync response");
        }
        Ok(vec![batch])
    }
}
