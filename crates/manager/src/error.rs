//! Manager error types

use thiserror::Error;

use sluice_config::ConfigError;
use sluice_runtime::ComponentError;

/// Errors raised by the environment and resource manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// A named resource is absent from its map.
    #[error("unable to locate resource: {0}")]
    ResourceNotFound(String),

    /// A named pipe is absent.
    #[error("unable to locate pipe: {0}")]
    PipeNotFound(String),

    /// Two resources of the same kind share a label.
    #[error("label '{0}' collides with a previously defined resource")]
    LabelCollision(String),

    /// A component type has no registered factory.
    #[error("unrecognised {kind} type '{name}'")]
    UnknownType {
        kind: &'static str,
        name: String,
    },

    /// No expression engine has been installed.
    #[error("no mapper engine installed")]
    NoMapperEngine,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Component(#[from] ComponentError),
}

impl ManagerError {
    pub fn unknown_type(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownType {
            kind,
            name: name.into(),
        }
    }
}
