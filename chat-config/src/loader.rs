//! File and environment loading.

use std::path::Path;

use tracing::{debug, info};

use crate::schema::{AppConfig, PromptMode, StrategyKind};
use crate::{ConfigError, ConfigResult};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "PARLEY_";

impl AppConfig {
    /// Loads `path`, falling back to defaults when the file does not exist,
    /// then validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] for unreadable
    /// or malformed files and [`ConfigError::Validation`] for bad values.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        config.validate()?;
        debug!(path = %path.display(), strategy = %config.context.strategy, "config loaded");
        Ok(config)
    }

    /// Applies `PARLEY_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when an override has an invalid
    /// value or leaves the configuration inconsistent.
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides resolved through `lookup`, which receives full
    /// variable names such as `PARLEY_STRATEGY`.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::apply_env_overrides`].
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(strategy) = var("STRATEGY") {
            self.context.strategy = strategy.parse::<StrategyKind>()?;
            debug!(strategy = %self.context.strategy, "strategy overridden from environment");
        }
        if let Some(model) = var("MODEL") {
            self.model.name = model;
        }
        if let Some(enabled) = var("GUARDRAILS") {
            self.guardrails.enabled = parse_flag("GUARDRAILS", &enabled)?;
        }
        if let Some(mode) = var("PROMPT_MODE") {
            self.prompts.mode = mode.parse::<PromptMode>()?;
        }

        self.validate()
    }
}

fn parse_flag(name: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::validation(format!(
            "{ENV_PREFIX}{name} must be true or false, got `{other}`"
        ))),
    }
}
