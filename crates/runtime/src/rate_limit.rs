//! Rate-limit resource contract

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ComponentError;

/// Cooperative throttle shared across components by name.
///
/// Callers hold exclusive access for the duration of each call; the
/// resource manager serializes concurrent users.
#[async_trait]
pub trait RateLimit: Send + Sync {
    /// Request admission.
    ///
    /// A zero duration grants admission now; a positive duration means the
    /// caller must wait that long and re-invoke. Errors are
    /// resource-internal failures only.
    async fn access(&mut self) -> Result<Duration, ComponentError>;

    /// Release resources held by the rate limit.
    async fn close(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}
