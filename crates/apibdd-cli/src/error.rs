//! Error types for the command line runner.
//!
//! Every variant describes a problem detected before the first scenario
//! runs, or while writing reports after the last one. Either way the process
//! exits with [`CliError::EXIT_CODE`].

use std::path::PathBuf;

use apibdd::{ConfigError, RegistryError, SourceError, TransportError};
use thiserror::Error;

/// Errors that stop the runner outside scenario execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// An invalid runner configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The API settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] ConfigError),

    /// A feature file could not be loaded.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The step bindings collided.
    #[error("step registration failed: {0}")]
    Registry(#[from] RegistryError),

    /// The HTTP client could not be built.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A report file could not be written.
    #[error("failed to write report {}: {message}", path.display())]
    Report {
        /// Report destination.
        path: PathBuf,
        /// Underlying failure.
        message: String,
    },
}

impl CliError {
    /// Process exit code for configuration, source and report errors.
    pub const EXIT_CODE: u8 = 2;
}
