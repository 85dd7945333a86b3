//! Batched input
//!
//! Consumes a child input and applies a batching policy to its stream.
//! Each source transaction is wrapped as a tracked ack; once a merged
//! batch resolves downstream, the outcome fans out to every source in
//! acceptance order.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;

use sluice_batch::{BatchPolicy, BatchPolicyConfig};
use sluice_config::ComponentConfig;
use sluice_manager::{Environment, ManagerError, Resources};
use sluice_message::{Tracked, Transaction};
use sluice_runtime::{InputHandle, Signaller};

use std::sync::Arc;

#[cfg(test)]
#[path = "batched_test.rs"]
mod tests;

const CHANNEL_CAPACITY: usize = 64;
const CHILD_CLOSE_DEADLINE: Duration = Duration::from_secs(5);

/// Configuration for the batched input.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchedConfig {
    /// The child input.
    pub child: ComponentConfig,

    /// The batching policy applied to the child's stream.
    #[serde(default)]
    pub policy: BatchPolicyConfig,
}

/// Build the child input and wrap it with the configured policy.
///
/// A policy with no triggers is a noop: the child is returned unwrapped.
pub fn build(
    config: BatchedConfig,
    env: &Arc<Environment>,
    resources: &Arc<Resources>,
) -> Result<InputHandle, ManagerError> {
    let child = env.build_input(&config.child, resources)?;
    if config.policy.is_noop() {
        return Ok(child);
    }
    let check = match &config.policy.check {
        Some(expr) => Some(env.mapper_engine()?.compile_condition(expr)?),
        None => None,
    };
    let policy = BatchPolicy::new(&config.policy, check);
    Ok(spawn(child, policy))
}

/// Wrap a running input with a batching policy.
pub fn spawn(child: InputHandle, policy: BatchPolicy) -> InputHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sig = Signaller::new();
    let worker = sig.clone();
    tokio::spawn(run(child, policy, tx, worker));
    InputHandle::new(rx, sig)
}

async fn run(
    mut child: InputHandle,
    mut policy: BatchPolicy,
    tx: mpsc::Sender<Transaction>,
    sig: Signaller,
) {
    let mut pending: Vec<Tracked> = Vec::new();

    'batching: while !sig.is_soft_stopped() {
        let timer = policy.until_next();
        let mut flush = false;
        let mut exit_after_flush = false;

        tokio::select! {
            tran = child.recv() => match tran {
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
                    // The child is gone but a timed batch is armed: honor
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
                    sent = tx.send(tran) => {
                        if sent.is_err() {
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

    drop(tx);
    child.trigger_close_now();
    if let Err(err) = child.wait_for_close(CHILD_CLOSE_DEADLINE).await {
        tracing::warn!(error = %err, "batched input child failed to close");
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
