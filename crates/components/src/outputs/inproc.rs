//! Inproc output
//!
//! Forwards transactions into a named in-process pipe. The pipe is owned
//! by the matching inproc input; until that input registers it, delivery
//! polls for the registration.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use sluice_manager::Resources;
use sluice_message::Transaction;
use sluice_runtime::{OutputHandle, Signaller};

#[cfg(test)]
#[path = "inproc_test.rs"]
mod tests;

const CHANNEL_CAPACITY: usize = 64;
const PIPE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawn the forwarding task and return its handle.
pub fn spawn(name: String, resources: &Arc<Resources>) -> OutputHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sig = Signaller::new();
    let worker = sig.clone();
    let resources = Arc::clone(resources);
    tokio::spawn(run(name, resources, rx, worker));
    OutputHandle::new(tx, sig)
}

async fn run(
    name: String,
    resources: Arc<Resources>,
    mut rx: mpsc::Receiver<Transaction>,
    sig: Signaller,
) {
    'forwarding: loop {
        let mut tran = tokio::select! {
            tran = rx.recv() => match tran {
                Some(tran) => tran,
                None => break,
            },
            _ = sig.hard_stopped() => break,
        };

        loop {
            let pipe = match resources.get_pipe(&name) {
                Ok(pipe) => pipe,
                Err(_) => {
                    tracing::debug!(pipe = %name, "waiting for pipe registration");
                    tokio::select! {
                        _ = tokio::time::sleep(PIPE_POLL_INTERVAL) => continue,
                        _ = sig.hard_stopped() => break 'forwarding,
                    }
                }
            };
            match pipe.send(tran).await {
                Ok(()) => break,
                Err(mpsc::error::SendError(returned)) => {
                    // The pipe's receiver is gone; wait for a fresh
                    // registration and redeliver.
                    tran = returned;
                    tokio::select! {
                        _ = tokio::time::sleep(PIPE_POLL_INTERVAL) => {}
                        _ = sig.hard_stopped() => break 'forwarding,
                    }
                }
            }
        }
    }
    sig.trigger_stopped();
}
