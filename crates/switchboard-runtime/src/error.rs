//! Runtime error types.

use switchboard_core::RegistryError;
use switchboard_transport::TransportError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while building or running a service.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Handler registration failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A listener failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The command line could not be parsed.
    #[error("{0}")]
    Cli(String),

    /// A dispatched command failed.
    #[error("error while executing command {name} : {message}")]
    Command {
        /// Subcommand that was executed.
        name: String,
        /// Failure reported by the dispatch.
        message: String,
    },
}

impl RuntimeError {
    pub(crate) fn command(name: impl Into<String>, message: impl ToString) -> Self {
        Self::Command {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

impl From<clap::Error> for RuntimeError {
    fn from(err: clap::Error) -> Self {
        Self::Cli(err.to_string())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
