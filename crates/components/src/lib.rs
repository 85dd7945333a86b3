//! Sluice - Components
//!
//! The built-in component families: processors, inputs, outputs, caches
//! and rate limits.
//!
//! # Registration
//!
//! Nothing registers itself. The binary (or a test) constructs an
//! [`Environment`](sluice_manager::Environment) and calls
//! [`register_all`], or the per-family `register_all` in each module, so
//! the full component set is always explicit at the call site.

pub mod caches;
pub mod inputs;
pub mod outputs;
pub mod processors;
pub mod rate_limits;

use sluice_manager::Environment;

/// Register every built-in component family.
pub fn register_all(env: &mut Environment) {
    processors::register_all(env);
    inputs::register_all(env);
    outputs::register_all(env);
    caches::register_all(env);
    rate_limits::register_all(env);
}
