//! Sluice - Stream
//!
//! The wiring between components: input, processor pipeline, output.
//!
//! # Architecture
//!
//! ```text
//! [Input] ──(Transaction chan)──> [Pipeline] ──(Transaction chan)──> [Output]
//!                                                     │
//!                                    [Batcher] splices in here when a
//!                                    batching policy is configured
//! ```
//!
//! Every hop is a bounded channel of transactions; the ack travels with
//! the batch and resolves exactly once. The batcher and the pipeline are
//! higher-order components: each wraps a handle and returns a new one, so
//! the engine composes them freely.

mod batcher;
mod engine;
mod pipeline;

pub use batcher::wrap as batch_output;
pub use engine::{Stream, StreamError};
pub use pipeline::spawn as spawn_pipeline;
