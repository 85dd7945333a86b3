//! Mutation processor
//!
//! Executes a compiled expression that transforms parts in place - later
//! statements observe earlier mutations. Error handling matches the
//! mapping processor: failures tag the original part and the batch
//! continues.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sluice_message::{Batch, Part};
use sluice_runtime::{BatchProcessor, ComponentError, Mapper};

#[cfg(test)]
#[path = "mutation_test.rs"]
mod tests;

/// Transforms parts in place via the expression executor.
pub struct MutationProcessor {
    exec: Arc<dyn Mapper>,
}

impl MutationProcessor {
    pub fn new(exec: Arc<dyn Mapper>) -> Self {
        Self { exec }
    }
}

#[async_trait]
impl BatchProcessor for MutationProcessor {
    async fn process_batch(
        &self,
        _ctx: &CancellationToken,
        batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError> {
        let mut new_batch: Vec<Part> = Vec::with_capacity(batch.len());
        for index in 0..batch.len() {
            match self.exec.map_onto(index, &batch) {
                Ok(Some(part)) => new_batch.push(part),
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(error = %err, "mutation failed");
                    let mut original = batch.get(index).expect("indexed part").clone();
                    original.set_error(err);
                    new_batch.push(original);
                }
            }
        }
        if new_batch.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Batch::new(new_batch)])
    }
}
