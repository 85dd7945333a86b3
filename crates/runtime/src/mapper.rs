//! Opaque expression-executor interface
//!
//! The engine treats the mapping language as an external collaborator.
//! The mapping and mutation processors and the batch policy's check
//! predicate all consume these narrow contracts.

use std::sync::Arc;

use sluice_batch::BatchCondition;
use sluice_message::{Batch, Part};

use crate::error::ComponentError;

/// A compiled expression applied to parts of a batch.
pub trait Mapper: Send + Sync {
    /// Build a new document from the indexed part; the source part is
    /// immutable during the mapping. `None` deletes the part.
    fn map_part(&self, index: usize, batch: &Batch) -> Result<Option<Part>, ComponentError>;

    /// Transform the indexed part in place - later statements observe
    /// earlier mutations. `None` deletes the part.
    fn map_onto(&self, index: usize, batch: &Batch) -> Result<Option<Part>, ComponentError>;
}

/// Compiles expression strings into executors and predicates.
pub trait MapperEngine: Send + Sync {
    fn compile(&self, expr: &str) -> Result<Arc<dyn Mapper>, ComponentError>;

    fn compile_condition(&self, expr: &str) -> Result<Arc<dyn BatchCondition>, ComponentError>;
}

impl std::fmt::Debug for dyn MapperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn MapperEngine")
    }
}
