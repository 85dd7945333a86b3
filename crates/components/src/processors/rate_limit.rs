//! Rate-limit processor
//!
//! Blocks each part until the named rate-limit resource admits it. Rate
//! limits are shared across components, so the throttle applies globally
//! to every pipeline referencing the same resource.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use sluice_config::ConfigError;
use sluice_manager::{ManagerError, Resources};
use sluice_message::Part;
use sluice_runtime::{ComponentError, Processor};

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;

const ACCESS_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Configuration for the rate-limit processor.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// The target rate-limit resource.
    pub resource: String,
}

/// Admits parts at the pace of a named rate-limit resource.
pub struct RateLimitProcessor {
    resource: String,
    resources: Arc<Resources>,
    closed: CancellationToken,
}

impl std::fmt::Debug for RateLimitProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitProcessor")
            .field("resource", &self.resource)
            .field("closed", &self.closed)
            .finish()
    }
}

impl RateLimitProcessor {
    pub fn new(resource: String, resources: Arc<Resources>) -> Result<Self, ManagerError> {
        if !resources.probe_rate_limit(&resource) {
            return Err(ManagerError::Config(ConfigError::bad_component(
                "rate_limit",
                format!("rate limit resource '{resource}' was not found"),
            )));
        }
        Ok(Self {
            resource,
            resources,
            closed: CancellationToken::new(),
        })
    }
}

#[async_trait]
impl Processor for RateLimitProcessor {
    async fn process(
        &self,
        ctx: &CancellationToken,
        part: Part,
    ) -> Result<Vec<Part>, ComponentError> {
        loop {
            let access = self
                .resources
                .access_rate_limit(&self.resource, |rate_limit| {
                    Box::pin(async move { rate_limit.access().await })
                })
                .await;

            if ctx.is_cancelled() {
                return Err(ComponentError::Cancelled);
            }

            let wait_for = match access {
                Ok(Ok(wait_for)) => wait_for,
                Ok(Err(err)) => {
                    tracing::error!(resource = %self.resource, error = %err, "failed to access rate limit");
                    ACCESS_ERROR_BACKOFF
                }
                Err(err) => {
                    tracing::error!(resource = %self.resource, error = %err, "failed to access rate limit");
                    ACCESS_ERROR_BACKOFF
                }
            };

            if wait_for.is_zero() {
                return Ok(vec![part]);
            }

            tokio::select! {
                _ = tokio::time::sleep(wait_for) => {}
                _ = ctx.cancelled() => return Err(ComponentError::Cancelled),
                _ = self.closed.cancelled() => return Err(ComponentError::Closed),
            }
        }
    }

    async fn close(&self) -> Result<(), ComponentError> {
        self.closed.cancel();
        Ok(())
    }
}
