//! Processor pipeline driver
//!
//! Consumes transactions from an upstream input, runs the processor
//! chain, and re-emits the results as downstream transactions. A fatal
//! processor error nacks the source; a fully dropped batch acks it with
//! success; a split result fans the source ack across every produced
//! batch.

use std::sync::Arc;

use tokio::sync::mpsc;

use sluice_message::{Tracked, Transaction};
use sluice_runtime::{execute_all, BatchProcessor, InputHandle, Signaller};

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;

const CHANNEL_CAPACITY: usize = 64;

/// Wrap an input with a processor chain, returning the processed stream.
///
/// An empty chain still re-emits transactions unchanged.
pub fn spawn(processors: Vec<Arc<dyn BatchProcessor>>, upstream: InputHandle) -> InputHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sig = Signaller::new();
    let worker = sig.clone();
    tokio::spawn(run(processors, upstream, tx, worker));
    InputHandle::new(rx, sig)
}

async fn run(
    processors: Vec<Arc<dyn BatchProcessor>>,
    mut upstream: InputHandle,
    tx: mpsc::Sender<Transaction>,
    sig: Signaller,
) {
    let ctx = sig.hard_token();

    'consuming: loop {
        let tran = tokio::select! {
            tran = upstream.recv() => match tran {
                Some(tran) => tran,
                None => break,
            },
            _ = sig.soft_stopped() => break,
        };

        let (batch, ack) = tran.into_parts();
        match execute_all(&ctx, &processors, vec![batch]).await {
            Err(err) => {
                tracing::error!(error = %err, "processors failed batch");
                if ack.resolve(Err(Arc::new(err))).is_err() {
                    tracing::debug!("source ack receiver gone");
                }
            }
            Ok(batches) => {
                for downstream in Tracked::fan_out(ack, batches) {
                    tokio::select! {
                        sent = tx.send(downstream) => {
                            if sent.is_err() {
                                tracing::error!("pipeline downstream closed early");
                                break 'consuming;
                            }
                        }
                        _ = sig.hard_stopped() => break 'consuming,
                    }
                }
            }
        }
    }

    for processor in &processors {
        if let Err(err) = processor.close().await {
            tracing::warn!(error = %err, "failed to close processor");
        }
    }
    upstream.trigger_close_now();
    sig.trigger_stopped();
}
