//! In-memory cache
//!
//! A process-local key/value map with optional per-entry expiry. Expired
//! entries are dropped lazily on lookup.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use sluice_runtime::{Cache, ComponentError};

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

/// Configuration for the memory cache.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryCacheConfig {
    /// Entry lifetime; entries never expire when unset.
    #[serde(with = "humantime_serde::option")]
    pub default_ttl: Option<Duration>,

    /// Entries present at construction.
    pub init_values: HashMap<String, String>,
}

struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

/// Process-local cache resource.
pub struct MemoryCache {
    ttl: Option<Duration>,
    entries: HashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new(config: MemoryCacheConfig) -> Self {
        let mut cache = Self {
            ttl: config.default_ttl,
            entries: HashMap::new(),
        };
        for (key, value) in config.init_values {
            let entry = cache.entry(Bytes::from(value.into_bytes()));
            cache.entries.insert(key, entry);
        }
        cache
    }

    fn entry(&self, value: Bytes) -> Entry {
        Entry {
            value,
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn live_entry(&mut self, key: &str) -> Option<&Entry> {
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= Instant::now());
        if expired {
            self.entries.remove(key);
        }
        self.entries.get(key)
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&mut self, key: &str) -> Result<Option<Bytes>, ComponentError> {
        Ok(self.live_entry(key).map(|e| e.value.clone()))
    }

    async fn set(&mut self, key: &str, value: Bytes) -> Result<(), ComponentError> {
        let entry = self.entry(value);
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn add(&mut self, key: &str, value: Bytes) -> Result<(), ComponentError> {
        if self.live_entry(key).is_some() {
            return Err(ComponentError::KeyAlreadyExists);
        }
        let entry = self.entry(value);
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&mut self, key: &str) -> Result<(), ComponentError> {
        self.entries.remove(key);
        Ok(())
    }
}
