//! Stdout output
//!
//! Writes each part's payload to standard output followed by a newline.
//! A transaction acks once every part of its batch has been written and
//! flushed; a write failure nacks it with the I/O error. The write loop
//! itself runs over any async writer.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use sluice_message::{shared_error, AckResult, Transaction};
use sluice_runtime::{OutputHandle, Signaller};

#[cfg(test)]
#[path = "stdout_test.rs"]
mod tests;

const CHANNEL_CAPACITY: usize = 64;

/// Spawn the stdout writer task and return its handle.
pub fn spawn() -> OutputHandle {
    to_writer(tokio::io::stdout())
}

fn to_writer<W>(writer: W) -> OutputHandle
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sig = Signaller::new();
    let worker = sig.clone();
    tokio::spawn(run(writer, rx, worker));
    OutputHandle::new(tx, sig)
}

async fn run<W>(mut writer: W, mut rx: mpsc::Receiver<Transaction>, sig: Signaller)
where
    W: AsyncWrite + Send + Unpin,
{
    tracing::debug!("stdout output starting");

    loop {
        let tran = tokio::select! {
            tran = rx.recv() => match tran {
                Some(tran) => tran,
                None => break,
            },
            _ = sig.hard_stopped() => break,
        };

        let (batch, ack) = tran.into_parts();
        let mut result: AckResult = Ok(());
        for part in batch.iter() {
            if let Err(err) = write_part(&mut writer, part.as_bytes()).await {
                result = Err(shared_error(err));
                break;
            }
        }
        if result.is_ok() {
            if let Err(err) = writer.flush().await {
                result = Err(shared_error(err));
            }
        }
        if ack.resolve(result).is_err() {
            tracing::debug!("stdout ack receiver gone");
        }
    }

    tracing::debug!("stdout output shutting down");
    sig.trigger_stopped();
}

async fn write_part<W>(writer: &mut W, payload: &[u8]) -> Result<(), std::io::Error>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(payload).await?;
    writer.write_all(b"\n").await
}
