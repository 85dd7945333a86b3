//! Inproc input
//!
//! Receives transactions over a named in-process pipe. The input end owns
//! the channel and registers the sender with the resource manager; any
//! writer (typically an inproc output in another stream) looks it up by
//! name.

use std::sync::Arc;

use tokio::sync::mpsc;

use sluice_manager::Resources;
use sluice_runtime::{InputHandle, Signaller};

#[cfg(test)]
#[path = "inproc_test.rs"]
mod tests;

const CHANNEL_CAPACITY: usize = 64;

/// Register the named pipe and return the receiving handle.
pub fn spawn(name: String, resources: &Arc<Resources>) -> InputHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    resources.set_pipe(&name, tx.clone());
    tracing::debug!(pipe = %name, "inproc input registered");

    let sig = Signaller::new();
    let worker = sig.clone();
    let resources = Arc::clone(resources);
    tokio::spawn(async move {
        worker.soft_stopped().await;
        // Only tears down this registration; a later one is left alone.
        resources.unset_pipe(&name, &tx);
        worker.trigger_stopped();
    });
    InputHandle::new(rx, sig)
}
