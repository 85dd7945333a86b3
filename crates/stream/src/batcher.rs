//! Output batcher adapter
//!
//! Wraps an output with a batching policy. One cooperative loop selects
//! over upstream arrivals, the policy's period timer, and the soft-stop
//! signal; accepted source acks are wrapped as tracked transactions and a
//! spawned tracker fans each downstream outcome back out in acceptance
//! order, stopping at the first undeliverable ack.

use std::time::Duration;

use tokio::sync::mpsc;

use sluice_batch::BatchPolicy;
use sluice_message::{Tracked, Transaction};
use sluice_runtime::{OutputHandle, Signaller};

#[cfg(test)]
#[path = "batcher_test.rs"]
mod tests;

const CHANNEL_CAPACITY: usize = 64;
const CHILD_CLOSE_DEADLINE: Duration = Duration::from_secs(5);

/// Wrap an output with a batching policy.
pub fn wrap(policy: BatchPolicy, child: OutputHandle) -> OutputHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sig = Signaller::new();
    let worker = sig.clone();
    tokio::spawn(run(policy, child, rx, worker));
    OutputHandle::new(tx, sig)
}

async fn run(
    mut policy: BatchPolicy,
    child: OutputHandle,
    mut rx: mpsc::Receiver<Transaction>,
    sig: Signaller,
) {
    let mut pending: Vec<Tracked> = Vec::new();

    'batching: while !sig.is_soft_stopped() {
        let timer = policy.until_next();
        let mut flush = false;
        let mut exit_after_flush = false;

        tokio::select! {
            tran = rx.recv() => match tran {
                Some(tran) => {
                    let (batch, ack) = tran.into_parts();
                    let tracked = Tracked::new(batch, ack);
                    for part in tracked.batch().iter() {
                        if policy.add(part.clone()) {
                            flush = true;
                        }
                    }
                    pending.push(tracked);
                }
                None => {
                    if policy.count() == 0 {
                        break 'batching;
                    }
                    // Upstream is gone but a timed batch is armed: honor
                    // it, unless a soft stop short-circuits the wait.
                    if let Some(remaining) = timer {
                        if !remaining.is_zero() {
                            tokio::select! {
                                _ = tokio::time::sleep(remaining) => {}
                                _ = sig.soft_stopped() => {}
                            }
                        }
                    }
                    flush = true;
                    exit_after_flush = true;
                }
            },
            _ = until_timed_batch(timer) => {
                flush = true;
            }
            _ = sig.soft_stopped() => {
                flush = true;
                exit_after_flush = true;
            }
        }

        if flush {
            if let Some(batch) = policy.flush() {
                let (tran, ack_rx) = Transaction::new(batch);
                tokio::select! {
                    sent = child.send(tran) => {
                        if sent.is_err() {
                            tracing::error!("batcher child output closed early");
                            break 'batching;
                        }
                    }
                    _ = sig.hard_stopped() => break 'batching,
                }

                let sources = std::mem::take(&mut pending);
                let tracker = sig.clone();
                tokio::spawn(async move {
                    let res = tokio::select! {
                        res = ack_rx => match res {
                            Ok(res) => res,
                            Err(_) => return,
                        },
                        _ = tracker.hard_stopped() => return,
                    };
                    for tracked in sources {
                        if tracked.ack(res.clone()).is_err() {
                            return;
                        }
                    }
                });
            }
        }

        if exit_after_flush {
            break 'batching;
        }
    }

    let child_sig = child.signaller().clone();
    if sig.is_hard_stopped() {
        child_sig.trigger_hard_stop();
    }
    drop(child);
    if let Err(err) = child_sig.wait_for_stop(CHILD_CLOSE_DEADLINE).await {
        tracing::warn!(error = %err, "batcher child failed to close");
    }
    sig.trigger_stopped();
}

async fn until_timed_batch(timer: Option<Duration>) {
    match timer {
        Some(remaining) if !remaining.is_zero() => tokio::time::sleep(remaining).await,
        Some(_) => {}
        None => std::future::pending().await,
    }
}
