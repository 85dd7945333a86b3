//! Mapping processor
//!
//! Executes a compiled expression on each part, creating a new document
//! that replaces (or filters) the original. The source part is treated as
//! immutable during the mapping. An executor failure keeps the original
//! part with its error tag set; the batch continues.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use sluice_message::{Batch, Part};
use sluice_runtime::{BatchProcessor, ComponentError, Mapper};

#[cfg(test)]
#[path = "mapping_test.rs"]
mod tests;

/// Builds new documents from parts via the expression executor.
pub struct MappingProcessor {
    exec: Arc<dyn Mapper>,
}

impl MappingProcessor {
    pub fn new(exec: Arc<dyn Mapper>) -> Self {
        Self { exec }
    }
}

#[async_trait]
impl BatchProcessor for MappingProcessor {
    async fn process_batch(
        &self,
        _ctx: &CancellationToken,
        batch: Batch,
    ) -> Result<Vec<Batch>, ComponentError> {
        let mut new_batch: Vec<Part> = Vec::with_capacity(batch.len());
        for index in 0..batch.len() {
            match self.exec.map_part(index, &batch) {
                Ok(Some(part)) => new_batch.push(part),
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(error = %err, "mapping failed");
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
