//! Built-in caches

mod memory;

pub use memory::{MemoryCache, MemoryCacheConfig};

use sluice_manager::Environment;

/// Register every built-in cache.
pub fn register_all(env: &mut Environment) {
    env.register_cache(
        "memory",
        Box::new(|conf, _env| {
            let config: MemoryCacheConfig = conf.parse_options()?;
            Ok(Box::new(MemoryCache::new(config)))
        }),
    );
}
