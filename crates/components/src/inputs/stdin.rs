//! Stdin input
//!
//! Reads newline-delimited messages from standard input. Delivery
//! failures cannot be redelivered from a terminal, so ack outcomes are
//! observed off the read path and logged. The read loop itself runs over
//! any buffered line source.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use sluice_message::{Batch, Part, Transaction};
use sluice_runtime::{InputHandle, Signaller};

#[cfg(test)]
#[path = "stdin_test.rs"]
mod tests;

const CHANNEL_CAPACITY: usize = 64;

/// Spawn the stdin reader task and return its handle.
pub fn spawn() -> InputHandle {
    from_reader(BufReader::new(tokio::io::stdin()))
}

fn from_reader<R>(reader: R) -> InputHandle
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sig = Signaller::new();
    let worker = sig.clone();
    tokio::spawn(run(reader, tx, worker));
    InputHandle::new(rx, sig)
}

async fn run<R>(reader: R, tx: mpsc::Sender<Transaction>, sig: Signaller)
where
    R: AsyncBufRead + Send + Unpin,
{
    tracing::debug!("stdin input starting");
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = sig.soft_stopped() => break,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "failed to read stdin");
                break;
            }
        };

        let batch = Batch::new(vec![Part::from(line.as_str())]);
        let (tran, ack_rx) = Transaction::new(batch);
        tokio::select! {
            sent = tx.send(tran) => {
                if sent.is_err() {
                    break;
                }
            }
            _ = sig.hard_stopped() => break,
        }

        let watcher = sig.clone();
        tokio::spawn(async move {
            tokio::select! {
                res = ack_rx => {
                    if let Ok(Err(err)) = res {
                        tracing::error!(error = %err, "failed to deliver stdin message");
                    }
                }
                _ = watcher.hard_stopped() => {}
            }
        });
    }

    tracing::debug!("stdin input shutting down");
    sig.trigger_stopped();
}
