//! Drop output
//!
//! Discards every batch and acks success immediately.

use tokio::sync::mpsc;

use sluice_message::Transaction;
use sluice_runtime::{OutputHandle, Signaller};

#[cfg(test)]
#[path = "drop_test.rs"]
mod tests;

const CHANNEL_CAPACITY: usize = 64;

/// Spawn the drop task and return its handle.
pub fn spawn() -> OutputHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sig = Signaller::new();
    let worker = sig.clone();
    tokio::spawn(run(rx, worker));
    OutputHandle::new(tx, sig)
}

async fn run(mut rx: mpsc::Receiver<Transaction>, sig: Signaller) {
    loop {
        let tran = tokio::select! {
            tran = rx.recv() => match tran {
                Some(tran) => tran,
                None => break,
            },
            _ = sig.hard_stopped() => break,
        };
        tracing::trace!(parts = tran.batch().len(), "dropping batch");
        let _ = tran.ack(Ok(()));
    }
    sig.trigger_stopped();
}
