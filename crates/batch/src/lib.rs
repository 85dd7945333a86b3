//! Sluice - Batch policy
//!
//! Aggregation of individual parts into batches, bounded by count, byte
//! size, time, or a user-defined predicate.
//!
//! # Design
//!
//! The policy is stateful and not safe for concurrent use; the batcher
//! loop that owns it serializes all calls. A policy with no trigger
//! configured is a noop - callers short-circuit and never instantiate the
//! aggregator.

mod policy;

pub use policy::{BatchCondition, BatchPolicy, BatchPolicyConfig};
