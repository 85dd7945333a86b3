//! Configuration error types

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid TOML syntax or structure.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Label does not match `[a-z][a-z0-9_]*` or is empty.
    #[error("label '{0}' is invalid: must match [a-z][a-z0-9_]*")]
    BadLabel(String),

    /// Environment variable referenced by the config is unset.
    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    /// Component options could not be decoded for the given type.
    #[error("invalid config for component '{component}': {reason}")]
    BadComponent { component: String, reason: String },
}

impl ConfigError {
    /// Create a component decode error.
    pub fn bad_component(component: impl Into<String>, reason: impl ToString) -> Self {
        Self::BadComponent {
            component: component.into(),
            reason: reason.to_string(),
        }
    }
}
