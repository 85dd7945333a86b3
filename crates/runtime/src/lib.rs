//! Sluice - Runtime
//!
//! The contracts every component family implements, and the runtime
//! plumbing shared between them.
//!
//! # Modules
//!
//! - `error` - the component error taxonomy
//! - `shutdown` - two-level stop signalling (soft / hard / stopped)
//! - `processor` - part and batch processor contracts plus `execute_all`
//! - `observed` - the auto-observed processor decorator
//! - `backoff` - exponential backoff with an elapsed-time budget
//! - `input` / `output` - handles to running stream components
//! - `cache` / `rate_limit` - resource contracts
//! - `mapper` - the opaque expression-executor interface
//! - `metrics` - per-processor counters

mod backoff;
mod cache;
mod error;
mod input;
mod mapper;
mod metrics;
mod observed;
mod output;
mod processor;
mod rate_limit;
mod shutdown;

pub use backoff::{Backoff, BackoffConfig};
pub use cache::Cache;
pub use error::ComponentError;
pub use input::InputHandle;
pub use mapper::{Mapper, MapperEngine};
pub use metrics::{ProcessorMetrics, ProcessorMetricsHandle, ProcessorSnapshot};
pub use observed::{ObservedBatch, ObservedParts};
pub use output::OutputHandle;
pub use processor::{execute_all, BatchProcessor, Processor};
pub use rate_limit::RateLimit;
pub use shutdown::Signaller;
