//! Component error taxonomy
//!
//! One enum covers processor, resource and lifecycle failures. Message
//! errors never appear here - they travel as part error tags. Cancellation
//! is always terminal for the current operation and never retried.

use thiserror::Error;

/// Errors surfaced by components.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// The operation's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// The component was closed while the operation was in flight.
    #[error("component was closed")]
    Closed,

    /// The component was asked to start a second time.
    #[error("component already started")]
    AlreadyStarted,

    /// The component has not been wired to the stream yet.
    #[error("component not connected")]
    NotConnected,

    /// A cache add hit an existing key.
    #[error("key already exists")]
    KeyAlreadyExists,

    /// Component-specific failure.
    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComponentError {
    /// Create a component-specific failure.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}
