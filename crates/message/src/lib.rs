//! Sluice - Message
//!
//! The value unit that flows through the pipeline, and the transaction
//! wrapper that carries its delivery receipt.
//!
//! # Overview
//!
//! - [`Part`] - a single message: payload bytes, metadata, error tag
//! - [`Batch`] - an ordered sequence of parts treated as one work item
//! - [`Transaction`] - a batch paired with a one-shot [`Ack`]
//! - [`Tracked`] - fan-in/fan-out aggregation of acks across splits and
//!   merges
//! - [`ResponseStore`] - the synchronous-response slot used by
//!   request/response capable inputs
//!
//! # Design
//!
//! Parts are shallow-copyable: cloning shares the payload buffer and the
//! metadata map, and metadata writes go through a copy-on-write layer so a
//! clone never mutates the original's visible metadata. The error tag is
//! advisory - it marks a part as failed without stopping it from flowing
//! downstream.
//!
//! Every hop between components is a channel of transactions. The ack must
//! resolve exactly once; this is enforced by move semantics on [`Ack`] and
//! by the counter inside [`Tracked`].

mod batch;
mod part;
mod response;
mod transaction;

pub use batch::Batch;
pub use part::{Metadata, Part};
pub use response::{set_as_response, NoResponseStore, ResponseStore};
pub use transaction::{Ack, AckError, AckResult, Tracked, Transaction};

use std::sync::Arc;

/// Cloneable error value carried by ack results and part error tags.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Wrap a concrete error as a [`SharedError`].
pub fn shared_error<E>(err: E) -> SharedError
where
    E: std::error::Error + Send + Sync + 'static,
{
    Arc::new(err)
}
