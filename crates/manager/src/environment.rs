//! Component registry
//!
//! Maps component type names to factories for each component family.
//! Factories receive the component's config element, the environment (for
//! nested components such as retry children), and the resource manager
//! (for resource-referencing components).

use std::collections::HashMap;
use std::sync::Arc;

use sluice_config::ComponentConfig;
use sluice_runtime::{
    BatchProcessor, Cache, InputHandle, MapperEngine, OutputHandle, RateLimit,
};

use crate::error::ManagerError;
use crate::resources::Resources;

#[cfg(test)]
#[path = "environment_test.rs"]
mod tests;

pub type InputFactory = Box<
    dyn Fn(&ComponentConfig, &Arc<Environment>, &Arc<Resources>) -> Result<InputHandle, ManagerError>
        + Send
        + Sync,
>;
pub type OutputFactory = Box<
    dyn Fn(&ComponentConfig, &Arc<Environment>, &Arc<Resources>) -> Result<OutputHandle, ManagerError>
        + Send
        + Sync,
>;
pub type ProcessorFactory = Box<
    dyn Fn(
            &ComponentConfig,
            &Arc<Environment>,
            &Arc<Resources>,
        ) -> Result<Arc<dyn BatchProcessor>, ManagerError>
        + Send
        + Sync,
>;
pub type CacheFactory = Box<
    dyn Fn(&ComponentConfig, &Arc<Environment>) -> Result<Box<dyn Cache>, ManagerError>
        + Send
        + Sync,
>;
pub type RateLimitFactory = Box<
    dyn Fn(&ComponentConfig, &Arc<Environment>) -> Result<Box<dyn RateLimit>, ManagerError>
        + Send
        + Sync,
>;

/// Registry of component factories plus the installed expression engine.
#[derive(Default)]
pub struct Environment {
    inputs: HashMap<String, InputFactory>,
    outputs: HashMap<String, OutputFactory>,
    processors: HashMap<String, ProcessorFactory>,
    caches: HashMap<String, CacheFactory>,
    rate_limits: HashMap<String, RateLimitFactory>,
    mapper_engine: Option<Arc<dyn MapperEngine>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_input(&mut self, name: impl Into<String>, factory: InputFactory) {
        self.inputs.insert(name.into(), factory);
    }

    pub fn register_output(&mut self, name: impl Into<String>, factory: OutputFactory) {
        self.outputs.insert(name.into(), factory);
    }

    pub fn register_processor(&mut self, name: impl Into<String>, factory: ProcessorFactory) {
        self.processors.insert(name.into(), factory);
    }

    pub fn register_cache(&mut self, name: impl Into<String>, factory: CacheFactory) {
        self.caches.insert(name.into(), factory);
    }

    pub fn register_rate_limit(&mut self, name: impl Into<String>, factory: RateLimitFactory) {
        self.rate_limits.insert(name.into(), factory);
    }

    /// Install the expression engine used by mapping components and batch
    /// policy checks.
    pub fn set_mapper_engine(&mut self, engine: Arc<dyn MapperEngine>) {
        self.mapper_engine = Some(engine);
    }

    pub fn mapper_engine(&self) -> Result<&Arc<dyn MapperEngine>, ManagerError> {
        self.mapper_engine
            .as_ref()
            .ok_or(ManagerError::NoMapperEngine)
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    pub fn has_processor(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    pub fn has_cache(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    pub fn has_rate_limit(&self, name: &str) -> bool {
        self.rate_limits.contains_key(name)
    }

    /// Registered input types, sorted for stable diagnostics.
    pub fn input_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.inputs.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn output_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.outputs.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn processor_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Build and start an input from its config element.
    pub fn build_input(
        self: &Arc<Self>,
        config: &ComponentConfig,
        resources: &Arc<Resources>,
    ) -> Result<InputHandle, ManagerError> {
        let factory = self
            .inputs
            .get(&config.type_name)
            .ok_or_else(|| ManagerError::unknown_type("input", &config.type_name))?;
        factory(config, self, resources)
    }

    /// Build and start an output from its config element.
    pub fn build_output(
        self: &Arc<Self>,
        config: &ComponentConfig,
        resources: &Arc<Resources>,
    ) -> Result<OutputHandle, ManagerError> {
        let factory = self
            .outputs
            .get(&config.type_name)
            .ok_or_else(|| ManagerError::unknown_type("output", &config.type_name))?;
        factory(config, self, resources)
    }

    /// Build a processor from its config element.
    pub fn build_processor(
        self: &Arc<Self>,
        config: &ComponentConfig,
        resources: &Arc<Resources>,
    ) -> Result<Arc<dyn BatchProcessor>, ManagerError> {
        let factory = self
            .processors
            .get(&config.type_name)
            .ok_or_else(|| ManagerError::unknown_type("processor", &config.type_name))?;
        factory(config, self, resources)
    }

    /// Build a cache from its config element.
    pub fn build_cache(
        self: &Arc<Self>,
        config: &ComponentConfig,
    ) -> Result<Box<dyn Cache>, ManagerError> {
        let factory = self
            .caches
            .get(&config.type_name)
            .ok_or_else(|| ManagerError::unknown_type("cache", &config.type_name))?;
        factory(config, self)
    }

    /// Build a rate limit from its config element.
    pub fn build_rate_limit(
        self: &Arc<Self>,
        config: &ComponentConfig,
    ) -> Result<Box<dyn RateLimit>, ManagerError> {
        let factory = self
            .rate_limits
            .get(&config.type_name)
            .ok_or_else(|| ManagerError::unknown_type("rate_limit", &config.type_name))?;
        factory(config, self)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("processors", &self.processors.len())
            .field("caches", &self.caches.len())
            .field("rate_limits", &self.rate_limits.len())
            .field("mapper_engine", &self.mapper_engine.is_some())
            .finish()
    }
}
