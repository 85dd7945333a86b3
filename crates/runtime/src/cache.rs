//! Cache resource contract

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ComponentError;

/// Named key/value store shared across components.
///
/// Callers hold exclusive access for the duration of each call; the
/// resource manager serializes concurrent users.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up a key.
    async fn get(&mut self, key: &str) -> Result<Option<Bytes>, ComponentError>;

    /// Set a key, overwriting any existing value.
    async fn set(&mut self, key: &str, value: Bytes) -> Result<(), ComponentError>;

    /// Set a key only if absent; [`ComponentError::KeyAlreadyExists`]
    /// otherwise.
    async fn add(&mut self, key: &str, value: Bytes) -> Result<(), ComponentError>;

    /// Remove a key. A missing key is a no-op.
    async fn delete(&mut self, key: &str) -> Result<(), ComponentError>;

    /// Release resources held by the cache.
    async fn close(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Cache")
    }
}
