//! Transaction - a batch paired with its one-shot delivery receipt
//!
//! # Design
//!
//! An [`Ack`] resolves exactly once, enforced by move semantics. The
//! producing input holds the matching receiver; an unresolved ack therefore
//! holds the input back (backpressure). When the receipt has to cross a
//! split or a merge, [`Tracked`] aggregates: an atomic counter plus a
//! one-shot error slot, where decrement-to-zero resolves the parent ack
//! with the first recorded error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::batch::Batch;
use crate::SharedError;

#[cfg(test)]
#[path = "transaction_test.rs"]
mod tests;

/// Outcome delivered through an ack: success, or the terminal failure.
pub type AckResult = Result<(), SharedError>;

/// The receipt could not be delivered - its receiver is gone.
///
/// Fan-out propagation treats this as a short circuit: no further source
/// acks are attempted, and the remainder stay pending until a hard stop
/// releases them.
#[derive(Debug, Error)]
#[error("ack receiver dropped before resolution")]
pub struct AckError;

enum AckInner {
    Channel(oneshot::Sender<AckResult>),
    Shared(Arc<TrackedShared>),
}

/// One-shot acknowledgement for a transaction.
pub struct Ack {
    inner: AckInner,
}

impl Ack {
    /// Create an ack and the receiver that observes its resolution.
    pub fn channel() -> (Self, oneshot::Receiver<AckResult>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                inner: AckInner::Channel(tx),
            },
            rx,
        )
    }

    /// Resolve the ack with the given outcome.
    pub fn resolve(self, res: AckResult) -> Result<(), AckError> {
        match self.inner {
            AckInner::Channel(tx) => tx.send(res).map_err(|_| AckError),
            AckInner::Shared(shared) => shared.complete(res),
        }
    }
}

impl std::fmt::Debug for Ack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.inner {
            AckInner::Channel(_) => "channel",
            AckInner::Shared(_) => "shared",
        };
        f.debug_struct("Ack").field("kind", &kind).finish()
    }
}

/// A batch paired with its acknowledgement.
#[derive(Debug)]
pub struct Transaction {
    batch: Batch,
    ack: Ack,
}

impl Transaction {
    /// Create a transaction, returning the receiver the producer awaits.
    pub fn new(batch: Batch) -> (Self, oneshot::Receiver<AckResult>) {
        let (ack, rx) = Ack::channel();
        (Self { batch, ack }, rx)
    }

    /// Pair a batch with an existing ack.
    pub fn from_ack(batch: Batch, ack: Ack) -> Self {
        Self { batch, ack }
    }

    /// The carried batch.
    #[inline]
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Resolve the transaction's ack with the given outcome.
    pub fn ack(self, res: AckResult) -> Result<(), AckError> {
        self.ack.resolve(res)
    }

    /// Split into the batch and the ack.
    pub fn into_parts(self) -> (Batch, Ack) {
        (self.batch, self.ack)
    }
}

struct TrackedShared {
    ack: Mutex<Option<Ack>>,
    pending: AtomicUsize,
    first_err: Mutex<Option<SharedError>>,
}

impl TrackedShared {
    fn new(ack: Ack, pending: usize) -> Self {
        Self {
            ack: Mutex::new(Some(ack)),
            pending: AtomicUsize::new(pending),
            first_err: Mutex::new(None),
        }
    }

    fn complete(&self, res: AckResult) -> Result<(), AckError> {
        if let Err(err) = res {
            let mut slot = self.first_err.lock();
            if slot.is_none() {
                *slot = Some(err);
            }
        }
        if self.pending.fetch_sub(1, Ordering::AcqRel) != 1 {
            return Ok(());
        }
        let ack = self.ack.lock().take().ok_or(AckError)?;
        let err = self.first_err.lock().take();
        ack.resolve(match err {
            Some(e) => Err(e),
            None => Ok(()),
        })
    }
}

/// Fan-in aggregator over a source ack.
///
/// Upstream ack fires exactly when every tracked downstream ack has fired;
/// the first recorded error wins and later outcomes are absorbed. Safe
/// under concurrent ack calls.
pub struct Tracked {
    batch: Batch,
    shared: Arc<TrackedShared>,
}

impl Tracked {
    /// Track a single pending downstream ack for the given source ack.
    pub fn new(batch: Batch, ack: Ack) -> Self {
        Self {
            batch,
            shared: Arc::new(TrackedShared::new(ack, 1)),
        }
    }

    /// The batch accepted from the source transaction.
    #[inline]
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Deliver the downstream outcome for this tracked transaction.
    pub fn ack(&self, res: AckResult) -> Result<(), AckError> {
        self.shared.complete(res)
    }

    /// Split one source ack across a set of downstream transactions.
    ///
    /// The source ack resolves once all children have resolved, carrying
    /// the first error any child reported. An empty split resolves the
    /// source immediately with success.
    pub fn fan_out(ack: Ack, batches: Vec<Batch>) -> Vec<Transaction> {
        if batches.is_empty() {
            let _ = ack.resolve(Ok(()));
            return Vec::new();
        }
        let shared = Arc::new(TrackedShared::new(ack, batches.len()));
        batches
            .into_iter()
            .map(|batch| {
                Transaction::from_ack(
                    batch,
                    Ack {
                        inner: AckInner::Shared(Arc::clone(&shared)),
                    },
                )
            })
            .collect()
    }
}

impl std::fmt::Debug for Tracked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracked")
            .field("parts", &self.batch.len())
            .field("pending", &self.shared.pending.load(Ordering::Relaxed))
            .finish()
    }
}
