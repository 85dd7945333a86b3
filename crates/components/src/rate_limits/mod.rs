//! Built-in rate limits

mod local;

pub use local::{LocalRateLimit, LocalRateLimitConfig};

use sluice_config::ConfigError;
use sluice_manager::{Environment, ManagerError};

/// Register every built-in rate limit.
pub fn register_all(env: &mut Environment) {
    env.register_rate_limit(
        "local",
        Box::new(|conf, _env| {
            let config: LocalRateLimitConfig = conf.parse_options()?;
            let rate_limit = LocalRateLimit::new(config).map_err(|reason| {
                ManagerError::Config(ConfigError::bad_component("local", reason))
            })?;
            Ok(Box::new(rate_limit))
        }),
    );
}
