//! Component configuration element
//!
//! Every configurable component is a table tagged by `type`, with its
//! options nested under a table named after that type:
//!
//! ```toml
//! type = "retry"
//! [retry]
//! max_retries = 2
//! ```

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

#[cfg(test)]
#[path = "component_test.rs"]
mod tests;

/// One component element of the config document.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentConfig {
    /// The component type, e.g. `stdin`, `retry`, `memory`.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Optional for streamed components, required and unique for
    /// resources.
    #[serde(default)]
    pub label: Option<String>,

    /// Remaining keys, including the type-named options table.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl ComponentConfig {
    /// Create a bare component config of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            label: None,
            options: HashMap::new(),
        }
    }

    /// The options table named after the component type; an empty table
    /// when absent.
    pub fn typed_options(&self) -> toml::Value {
        self.options
            .get(&self.type_name)
            .cloned()
            .unwrap_or_else(|| toml::Value::Table(toml::value::Table::new()))
    }

    /// Decode the type-named options table into a config struct.
    pub fn parse_options<T: DeserializeOwned>(&self) -> Result<T> {
        self.typed_options()
            .try_into()
            .map_err(|e| ConfigError::bad_component(&self.type_name, e))
    }

    /// Look up a sibling option outside the type-named table, e.g. the
    /// `batching` section on an output.
    pub fn option(&self, key: &str) -> Option<&toml::Value> {
        self.options.get(key)
    }

    /// Decode a sibling option into a config struct, if present.
    pub fn parse_option<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.options.get(key) {
            None => Ok(None),
            Some(value) => value
                .clone()
                .try_into()
                .map(Some)
                .map_err(|e| ConfigError::bad_component(&self.type_name, e)),
        }
    }
}

/// Check a resource label against `[a-z][a-z0-9_]*`.
pub fn validate_label(label: &str) -> Result<()> {
    let mut chars = label.bytes();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_lowercase()
                && chars.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        }
        None => false,
    };
    if !valid {
        return Err(ConfigError::BadLabel(label.to_string()));
    }
    Ok(())
}
