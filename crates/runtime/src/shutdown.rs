//! Two-level shutdown signalling
//!
//! # Design
//!
//! Four events drive component teardown: soft stop requested (finish
//! in-flight work, flush), hard stop requested (abandon in-flight work),
//! and stopped (the component has quiesced). Each is a broadcast
//! cancellation token, so any number of tasks can select on them.
//!
//! A hard stop implies the soft stop; components that only watch the soft
//! token still wake up.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ComponentError;

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod tests;

/// Broadcast stop signalling for one component.
///
/// Clones share the underlying tokens.
#[derive(Clone, Debug, Default)]
pub struct Signaller {
    soft: CancellationToken,
    hard: CancellationToken,
    stopped: CancellationToken,
}

impl Signaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful stop: finish in-flight work, flush, exit.
    pub fn trigger_soft_stop(&self) {
        self.soft.cancel();
    }

    /// Request an immediate stop: abandon in-flight work.
    ///
    /// Implies the soft stop.
    pub fn trigger_hard_stop(&self) {
        self.soft.cancel();
        self.hard.cancel();
    }

    /// Mark the component as fully stopped.
    pub fn trigger_stopped(&self) {
        self.stopped.cancel();
    }

    pub fn is_soft_stopped(&self) -> bool {
        self.soft.is_cancelled()
    }

    pub fn is_hard_stopped(&self) -> bool {
        self.hard.is_cancelled()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    /// Wait for the soft-stop request.
    pub async fn soft_stopped(&self) {
        self.soft.cancelled().await;
    }

    /// Wait for the hard-stop request.
    pub async fn hard_stopped(&self) {
        self.hard.cancelled().await;
    }

    /// Wait for the component to quiesce.
    pub async fn stopped(&self) {
        self.stopped.cancelled().await;
    }

    /// Token cancelled by the soft stop; guards the leisure phase of
    /// shutdown work.
    pub fn soft_token(&self) -> CancellationToken {
        self.soft.clone()
    }

    /// Token cancelled by the hard stop; guards final cleanup.
    pub fn hard_token(&self) -> CancellationToken {
        self.hard.clone()
    }

    /// Block until the component has stopped, up to `timeout`.
    pub async fn wait_for_stop(&self, timeout: Duration) -> Result<(), ComponentError> {
        tokio::time::timeout(timeout, self.stopped())
            .await
            .map_err(|_| ComponentError::failed("component failed to stop within deadline"))
    }
}
