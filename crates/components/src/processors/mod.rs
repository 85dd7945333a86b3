//! Built-in processors

mod compress;
mod mapping;
mod mutation;
mod rate_limit;
mod retry;
mod sync_response;

pub use compress::{Algorithm, CompressConfig, CompressProcessor};
pub use mapping::MappingProcessor;
pub use mutation::MutationProcessor;
pub use rate_limit::{RateLimitConfig, RateLimitProcessor};
pub use retry::{RetryConfig, RetryProcessor};
pub use sync_response::SyncResponseProcessor;

use std::sync::Arc;

use sluice_config::ConfigError;
use sluice_manager::{Environment, ManagerError};
use sluice_runtime::{BatchProcessor, ObservedBatch, ObservedParts};

/// Register every built-in processor.
pub fn register_all(env: &mut Environment) {
    env.register_processor(
        "retry",
        Box::new(|conf, env, resources| {
            let config: RetryConfig = conf.parse_options()?;
            if config.processors.is_empty() {
                return Err(ManagerError::Config(ConfigError::bad_component(
                    "retry",
                    "at least one child processor must be specified",
                )));
            }
            let children = config
                .processors
                .iter()
                .map(|child| env.build_processor(child, resources))
                .collect::<Result<Vec<_>, _>>()?;
            let processor = RetryProcessor::new(
                children,
                config.backoff,
                config.parallel,
                config.max_retries,
            );
            Ok(Arc::new(ObservedBatch::new("retry", Box::new(processor)))
                as Arc<dyn BatchProcessor>)
        }),
    );

    env.register_processor(
        "rate_limit",
        Box::new(|conf, _env, resources| {
            let config: RateLimitConfig = conf.parse_options()?;
            let processor = RateLimitProcessor::new(config.resource, Arc::clone(resources))?;
            Ok(
                Arc::new(ObservedParts::new("rate_limit", Box::new(processor)))
                    as Arc<dyn BatchProcessor>,
            )
        }),
    );

    env.register_processor(
        "mapping",
        Box::new(|conf, env, _resources| {
            let expr: String = conf.parse_options()?;
            let exec = env.mapper_engine()?.compile(&expr)?;
            Ok(
                Arc::new(ObservedBatch::new("mapping", Box::new(MappingProcessor::new(exec))))
                    as Arc<dyn BatchProcessor>,
            )
        }),
    );

    env.register_processor(
        "mutation",
        Box::new(|conf, env, _resources| {
            let expr: String = conf.parse_options()?;
            let exec = env.mapper_engine()?.compile(&expr)?;
            Ok(
                Arc::new(ObservedBatch::new("mutation", Box::new(MutationProcessor::new(exec))))
                    as Arc<dyn BatchProcessor>,
            )
        }),
    );

    env.register_processor(
        "sync_response",
        Box::new(|_conf, _env, _resources| {
            Ok(Arc::new(ObservedBatch::new(
                "sync_response",
                Box::new(SyncResponseProcessor),
            )) as Arc<dyn BatchProcessor>)
        }),
    );

    env.register_processor(
        "compress",
        Box::new(|conf, _env, _resources| {
            let config: CompressConfig = conf.parse_options()?;
            let processor = CompressProcessor::new(config.algorithm, config.level);
            Ok(
                Arc::new(ObservedParts::new("compress", Box::new(processor)))
                    as Arc<dyn BatchProcessor>,
            )
        }),
    );
}
