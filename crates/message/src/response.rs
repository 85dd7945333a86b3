//! Synchronous-response slot for request/response capable inputs

use parking_lot::Mutex;
use thiserror::Error;

use crate::batch::Batch;

/// The batch has no response store attached.
///
/// Most inputs never attach one; stamping a response is then dropped
/// without penalty.
#[derive(Debug, Error)]
#[error("batch has no response store attached")]
pub struct NoResponseStore;

/// One-slot store for the synchronous response of a request batch.
///
/// Setting the slot replaces any previous response, so stamping a batch
/// twice is equivalent to stamping it once.
#[derive(Debug, Default)]
pub struct ResponseStore {
    slot: Mutex<Option<Batch>>,
}

impl ResponseStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the response, replacing any previous one.
    pub fn set(&self, batch: Batch) {
        *self.slot.lock() = Some(batch);
    }

    /// Take the stored response, leaving the slot empty.
    pub fn take(&self) -> Option<Batch> {
        self.slot.lock().take()
    }

    /// Whether a response has been stored.
    pub fn is_set(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// Stamp the batch in its current state as the synchronous response.
///
/// The store is looked up on the first part; inputs attach the same store
/// to every part of a request batch.
pub fn set_as_response(batch: &Batch) -> Result<(), NoResponseStore> {
    let store = batch
        .get(0)
        .and_then(|part| part.response_store())
        .ok_or(NoResponseStore)?;
    store.set(batch.clone());
    Ok(())
}
