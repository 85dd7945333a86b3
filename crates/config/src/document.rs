//! The top-level engine document

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::component::ComponentConfig;
use crate::env::interpolate_env;
use crate::error::{ConfigError, Result};

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;

/// Full engine configuration: input, pipeline, output, resources.
///
/// All sections are optional at parse time; the stream builder decides
/// what is required to run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub input: Option<ComponentConfig>,
    pub pipeline: PipelineConfig,
    pub output: Option<ComponentConfig>,
    pub resources: ResourcesConfig,
}

/// The processor chain between input and output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub processors: Vec<ComponentConfig>,
}

/// Named resources, each list keyed by unique labels.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    pub caches: Vec<ComponentConfig>,
    pub rate_limits: Vec<ComponentConfig>,
    pub processors: Vec<ComponentConfig>,
    pub inputs: Vec<ComponentConfig>,
    pub outputs: Vec<ComponentConfig>,
}

impl EngineConfig {
    /// Load from a file, interpolating `${VAR}` references first.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let interpolated = interpolate_env(&raw)?;
        interpolated.parse()
    }
}

impl FromStr for EngineConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
