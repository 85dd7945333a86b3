//! Handle to a running output component
//!
//! An output runs as its own task, consuming transactions from a bounded
//! channel and resolving their acks once delivery is durable. The handle
//! is the producer side plus lifecycle control.

use std::time::Duration;

use tokio::sync::mpsc;

use sluice_message::Transaction;

use crate::error::ComponentError;
use crate::shutdown::Signaller;

/// Producer handle for a running output.
pub struct OutputHandle {
    transactions: mpsc::Sender<Transaction>,
    sig: Signaller,
}

impl OutputHandle {
    pub fn new(transactions: mpsc::Sender<Transaction>, sig: Signaller) -> Self {
        Self { transactions, sig }
    }

    /// Hand a transaction to the output. Waits for channel capacity.
    pub async fn send(&self, tran: Transaction) -> Result<(), ComponentError> {
        self.transactions
            .send(tran)
            .await
            .map_err(|_| ComponentError::Closed)
    }

    /// Clone the underlying sender, for loops that select on the send.
    pub fn sender(&self) -> mpsc::Sender<Transaction> {
        self.transactions.clone()
    }

    /// Ask the output to finish in-flight work and exit.
    pub fn trigger_stop(&self) {
        self.sig.trigger_soft_stop();
    }

    /// Ask the output to abandon in-flight work.
    pub fn trigger_close_now(&self) {
        self.sig.trigger_hard_stop();
    }

    /// Wait for the output task to quiesce.
    pub async fn wait_for_close(&self, timeout: Duration) -> Result<(), ComponentError> {
        self.sig.wait_for_stop(timeout).await
    }

    /// The output's signaller.
    pub fn signaller(&self) -> &Signaller {
        &self.sig
    }
}
