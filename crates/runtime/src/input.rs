//! Handle to a running input component
//!
//! An input runs as its own task, producing transactions into a bounded
//! channel. The handle is the consumer side plus lifecycle control. The
//! producer task is expected to watch the signaller's soft token (stop
//! producing, resolve what is pending) and hard token (abandon and exit),
//! and to trigger `stopped` on the way out.

use std::time::Duration;

use tokio::sync::mpsc;

use sluice_message::Transaction;

use crate::error::ComponentError;
use crate::shutdown::Signaller;

/// Consumer handle for a running input.
#[derive(Debug)]
pub struct InputHandle {
    transactions: mpsc::Receiver<Transaction>,
    sig: Signaller,
}

impl InputHandle {
    pub fn new(transactions: mpsc::Receiver<Transaction>, sig: Signaller) -> Self {
        Self { transactions, sig }
    }

    /// Receive the next transaction. `None` once the input has finished
    /// and drained.
    pub async fn recv(&mut self) -> Option<Transaction> {
        self.transactions.recv().await
    }

    /// Ask the input to stop consuming its source; in-flight transactions
    /// still resolve.
    pub fn trigger_stop_consuming(&self) {
        self.sig.trigger_soft_stop();
    }

    /// Ask the input to abandon everything immediately.
    pub fn trigger_close_now(&self) {
        self.sig.trigger_hard_stop();
    }

    /// Wait for the input task to quiesce.
    pub async fn wait_for_close(&self, timeout: Duration) -> Result<(), ComponentError> {
        self.sig.wait_for_stop(timeout).await
    }

    /// The input's signaller, for components that splice themselves in.
    pub fn signaller(&self) -> &Signaller {
        &self.sig
    }
}
