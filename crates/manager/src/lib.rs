//! Sluice - Manager
//!
//! Named lookup for shared resources, and the registry that turns config
//! elements into running components.
//!
//! # Design
//!
//! - [`Environment`] maps component type names to factories. Registration
//!   is explicit: the binary calls each component family's
//!   `register_all` at engine construction, so the set of available
//!   components is always visible at the call site.
//! - [`Resources`] holds the five label-keyed resource maps (caches, rate
//!   limits, processors, inputs, outputs), a generic typed store for
//!   cross-component state, and named transaction pipes.
//! - Caches and rate limits are accessed through closures that hold an
//!   async mutex for their duration, so concurrent users serialize and no
//!   lock is visible outside the manager.

mod environment;
mod error;
mod resources;

pub use environment::{
    CacheFactory, Environment, InputFactory, OutputFactory, ProcessorFactory, RateLimitFactory,
};
pub use error::ManagerError;
pub use resources::{BoxFuture, Resources};
