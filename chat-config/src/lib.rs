//! Configuration management for parley.
//!
//! [`schema`] defines the strongly typed sections of `parley.toml`;
//! [`loader`] reads the file, applies `PARLEY_*` environment overrides and
//! validates the result.

#![warn(missing_docs, clippy::pedantic)]

use std::path::PathBuf;

use thiserror::Error;

pub mod loader;
pub mod schema;

pub use loader::ENV_PREFIX;
pub use schema::{
    AppConfig, ContextConfig, GuardrailsConfig, LoggingConfig, ModelConfig, PromptMode,
    PromptsConfig, StrategyKind,
};

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config at {path}: {reason}")]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        reason: String,
    },

    /// The configuration file is not valid TOML for [`AppConfig`].
    #[error("failed to parse config at {path}: {reason}")]
    Parse {
        /// Path that was being parsed.
        path: PathBuf,
        /// Parser error message.
        reason: String,
    },

    /// A value is out of range or inconsistent with another.
    #[error("invalid configuration: {reason}")]
    Validation {
        /// Description of the offending setting.
        reason: String,
    },
}

impl ConfigError {
    /// Convenience constructor for validation failures.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}
