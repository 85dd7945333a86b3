//! Sluice - Configuration
//!
//! The declarative TOML document that describes an engine: one input, a
//! pipeline of processors, one output, and named resources.
//!
//! # Example
//!
//! ```toml
//! [input]
//! type = "stdin"
//!
//! [[pipeline.processors]]
//! type = "mapping"
//! mapping = "root = this"
//!
//! [output]
//! type = "stdout"
//!
//! [[resources.rate_limits]]
//! label = "api"
//! type = "local"
//! [resources.rate_limits.local]
//! count = 10
//! interval = "1s"
//! ```
//!
//! Streamed components (input, pipeline processors, output) may carry an
//! optional label; resources require a unique, non-empty one.

mod component;
mod document;
mod env;
mod error;

pub use component::{validate_label, ComponentConfig};
pub use document::{EngineConfig, PipelineConfig, ResourcesConfig};
pub use env::interpolate_env;
pub use error::{ConfigError, Result};
