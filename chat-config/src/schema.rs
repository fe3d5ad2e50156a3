//! Strongly typed configuration sections.

use std::fmt;
use std::str::FromStr;

use chat_primitives::PromptType;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Root configuration, mapped directly to `parley.toml`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Generation model settings.
    #[serde(default)]
    pub model: ModelConfig,
    /// Context compaction settings.
    #[serde(default)]
    pub context: ContextConfig,
    /// Input guardrail settings.
    #[serde(default)]
    pub guardrails: GuardrailsConfig,
    /// Prompt template selection.
    #[serde(default)]
    pub prompts: PromptsConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Checks ranges and cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending setting.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::validation(format!(
                "model.temperature must be between 0.0 and 2.0, got {}",
                self.model.temperature
            )));
        }
        if self.model.max_tokens == 0 {
            return Err(ConfigError::validation("model.max_tokens must be at least 1"));
        }
        self.context.validate()
    }

    /// Renders the default configuration as TOML.
    #[must_use]
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Generation model settings. The transport itself is supplied by the host.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ModelConfig {
    /// Provider label, informational only.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name; also selects the pricing row.
    #[serde(default = "default_model")]
    pub name: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum output tokens per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider() -> String {
    "scripted".into()
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    10_000
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Context compaction algorithm.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Send the full history.
    None,
    /// Keep the most recent messages.
    #[default]
    SlidingWindow,
    /// Summarize older messages.
    Summary,
    /// Let a model pick relevant messages.
    #[serde(alias = "smart")]
    SmartSelection,
}

impl StrategyKind {
    /// Returns the configuration name of the strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SlidingWindow => "sliding_window",
            Self::Summary => "summary",
            Self::SmartSelection => "smart_selection",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "sliding_window" => Ok(Self::SlidingWindow),
            "summary" => Ok(Self::Summary),
            "smart_selection" | "smart" => Ok(Self::SmartSelection),
            other => Err(ConfigError::validation(format!(
                "unknown context strategy `{other}`"
            ))),
        }
    }
}

/// Context compaction settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContextConfig {
    /// Selected strategy.
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Sliding window size, in non-system messages.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Messages kept verbatim after summarization.
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
    /// Non-system message count above which summarization runs.
    #[serde(default = "default_summarize_threshold")]
    pub summarize_threshold: usize,
    /// Exchanges the smart selection strategy may pick.
    #[serde(default = "default_max_selected")]
    pub max_selected: usize,
}

fn default_max_messages() -> usize {
    10
}

fn default_keep_recent() -> usize {
    6
}

fn default_summarize_threshold() -> usize {
    15
}

fn default_max_selected() -> usize {
    4
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            max_messages: default_max_messages(),
            keep_recent: default_keep_recent(),
            summarize_threshold: default_summarize_threshold(),
            max_selected: default_max_selected(),
        }
    }
}

impl ContextConfig {
    /// Default settings with a different strategy.
    #[must_use]
    pub fn with_strategy(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Checks the strategy parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for zero sizes or a summarize
    /// threshold below `keep_recent`.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_messages == 0 {
            return Err(ConfigError::validation("context.max_messages must be at least 1"));
        }
        if self.max_selected == 0 {
            return Err(ConfigError::validation("context.max_selected must be at least 1"));
        }
        if self.summarize_threshold < self.keep_recent {
            return Err(ConfigError::validation(format!(
                "context.summarize_threshold ({}) must not be below context.keep_recent ({})",
                self.summarize_threshold, self.keep_recent
            )));
        }
        Ok(())
    }
}

/// Input guardrail settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GuardrailsConfig {
    /// Run the guardrails at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Run the model-assisted layer when an analysis adapter is available.
    #[serde(default)]
    pub llm_analysis: bool,
    /// Name the assistant may be addressed by without tripping the
    /// role-change patterns.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
}

fn default_true() -> bool {
    true
}

fn default_assistant_name() -> String {
    "parley".into()
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            llm_analysis: false,
            assistant_name: default_assistant_name(),
        }
    }
}

/// How the prompt type of a turn is chosen.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum PromptMode {
    /// Detect the type per turn.
    #[default]
    Auto,
    /// Always use this type.
    Pinned(PromptType),
}

impl PromptMode {
    /// Returns the pinned type, if any.
    #[must_use]
    pub const fn pinned(self) -> Option<PromptType> {
        match self {
            Self::Auto => None,
            Self::Pinned(kind) => Some(kind),
        }
    }
}

impl FromStr for PromptMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<PromptType>()
            .map(Self::Pinned)
            .map_err(|err| ConfigError::validation(format!("prompts.mode: {err}")))
    }
}

impl TryFrom<String> for PromptMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PromptMode> for String {
    fn from(mode: PromptMode) -> Self {
        match mode {
            PromptMode::Auto => "auto".into(),
            PromptMode::Pinned(kind) => kind.as_str().into(),
        }
    }
}

/// Prompt template selection.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PromptsConfig {
    /// `auto` or a pinned prompt type name.
    #[serde(default)]
    pub mode: PromptMode,
}

/// Log output settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default `tracing` filter, used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.context.strategy, StrategyKind::SlidingWindow);
        assert_eq!(config.model.name, "gemini-2.0-flash");
        assert_eq!(config.prompts.mode, PromptMode::Auto);
    }

    #[test]
    fn config_roundtrip_toml() {
        let mut config = AppConfig::default();
        config.prompts.mode = PromptMode::Pinned(PromptType::Debugging);
        config.context.strategy = StrategyKind::Summary;

        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [context]
            strategy = "smart"
            max_selected = 2

            [prompts]
            mode = "code_review"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.context.strategy, StrategyKind::SmartSelection);
        assert_eq!(parsed.context.max_selected, 2);
        assert_eq!(parsed.context.keep_recent, 6);
        assert_eq!(parsed.prompts.mode.pinned(), Some(PromptType::CodeReview));
        assert!(parsed.guardrails.enabled);
    }

    #[test]
    fn unknown_prompt_mode_is_a_parse_error() {
        let parsed = toml::from_str::<AppConfig>("[prompts]\nmode = \"poetry\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        let mut config = AppConfig::default();
        config.model.temperature = 3.5;
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));

        let mut config = AppConfig::default();
        config.context.summarize_threshold = 2;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.context.max_messages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!("smart".parse::<StrategyKind>().unwrap(), StrategyKind::SmartSelection);
        assert_eq!("None".parse::<StrategyKind>().unwrap(), StrategyKind::None);
        assert!("random".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn default_toml_generation() {
        let rendered = AppConfig::default_toml();
        assert!(rendered.contains("[context]"));
        assert!(rendered.contains("strategy = \"sliding_window\""));
        assert!(rendered.contains("mode = \"auto\""));
    }
}
