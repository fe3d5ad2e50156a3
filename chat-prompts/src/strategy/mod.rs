//! Interchangeable context compaction strategies.
//!
//! Every strategy keeps `system` messages verbatim, reduces only the
//! `user`/`assistant` messages, and re-prepends the preserved system messages
//! in their original relative order. Thresholds count non-system messages.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chat_adapters::ModelAdapter;
use chat_config::{ContextConfig, StrategyKind};
use chat_primitives::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

mod selection;
mod sliding;
mod summary;

pub use selection::SmartSelectionStrategy;
pub use sliding::SlidingWindowStrategy;
pub use summary::SummaryStrategy;

/// Result alias for strategy construction.
pub type ContextResult<T> = Result<T, ContextError>;

/// Errors raised while building a strategy.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The strategy needs a model adapter and none was supplied.
    #[error("context strategy `{strategy}` requires a model adapter")]
    MissingAdapter {
        /// The requested strategy.
        strategy: StrategyKind,
    },
}

/// Read-only snapshot of strategy counters.
///
/// Counters accumulate for the lifetime of the strategy instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyStats(BTreeMap<String, Value>);

impl StrategyStats {
    /// Creates a snapshot tagged with the strategy name.
    #[must_use]
    pub fn new(strategy: &str) -> Self {
        Self::default().with("strategy", strategy)
    }

    /// Adds or replaces a counter.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_owned(), value.into());
        self
    }

    /// Returns the raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns an integer counter.
    #[must_use]
    pub fn count(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Returns the strategy name the snapshot was taken from.
    #[must_use]
    pub fn strategy(&self) -> Option<&str> {
        self.0.get("strategy").and_then(Value::as_str)
    }

    /// Iterates over every counter in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Capability shared by all context strategies.
///
/// Instances own their counters. Reusing one instance across conversations
/// accumulates counters across them.
#[async_trait]
pub trait ContextStrategy: Send + Sync {
    /// Stable strategy name, matching the configuration value.
    fn name(&self) -> &'static str;

    /// Reduces `messages` before they are sent alongside `new_query`.
    ///
    /// Never fails: model-assisted strategies fall back to a deterministic
    /// subset when their collaborator does.
    async fn optimize(&mut self, messages: &[Message], new_query: &str) -> Vec<Message>;

    /// Cumulative counters since construction.
    fn stats(&self) -> StrategyStats;
}

/// Builds the strategy selected by `config`.
///
/// Returns `Ok(None)` for [`StrategyKind::None`].
///
/// # Errors
///
/// Returns [`ContextError::MissingAdapter`] when a model-assisted strategy is
/// requested without an adapter.
pub fn try_build_strategy(
    config: &ContextConfig,
    adapter: Option<Arc<dyn ModelAdapter>>,
) -> ContextResult<Option<Box<dyn ContextStrategy>>> {
    let strategy: Box<dyn ContextStrategy> = match (config.strategy, adapter) {
        (StrategyKind::None, _) => return Ok(None),
        (StrategyKind::SlidingWindow, _) => {
            Box::new(SlidingWindowStrategy::new(config.max_messages))
        }
        (StrategyKind::Summary, Some(adapter)) => Box::new(SummaryStrategy::new(
            adapter,
            config.keep_recent,
            config.summarize_threshold,
        )),
        (StrategyKind::SmartSelection, Some(adapter)) => {
            Box::new(SmartSelectionStrategy::new(adapter, config.max_selected))
        }
        (strategy, None) => return Err(ContextError::MissingAdapter { strategy }),
    };
    Ok(Some(strategy))
}

/// Builds the strategy selected by `config`, falling back to a sliding window
/// when a model-assisted strategy has no adapter.
#[must_use]
pub fn build_strategy(
    config: &ContextConfig,
    adapter: Option<Arc<dyn ModelAdapter>>,
) -> Option<Box<dyn ContextStrategy>> {
    match try_build_strategy(config, adapter) {
        Ok(strategy) => strategy,
        Err(err) => {
            warn!(error = %err, "falling back to sliding window");
            Some(Box::new(SlidingWindowStrategy::new(config.max_messages)))
        }
    }
}

/// Splits `messages` into (system, other) preserving relative order.
pub(crate) fn partition(messages: &[Message]) -> (Vec<Message>, Vec<Message>) {
    messages.iter().cloned().partition(Message::is_system)
}

/// Re-prepends `system` before the reduced `rest`.
pub(crate) fn reassemble(
    mut system: Vec<Message>,
    rest: impl IntoIterator<Item = Message>,
) -> Vec<Message> {
    system.extend(rest);
    system
}

/// Returns the last `count` items of `items`.
pub(crate) fn tail<T: Clone>(items: &[T], count: usize) -> Vec<T> {
    items[items.len().saturating_sub(count)..].to_vec()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chat_primitives::Message;

    /// System prompt followed by `turns` alternating user/assistant messages.
    pub fn conversation(turns: usize) -> Vec<Message> {
        let mut messages = vec![Message::system("You are a coding assistant.")];
        for idx in 0..turns {
            if idx % 2 == 0 {
                messages.push(Message::user(format!("question {idx}")));
            } else {
                messages.push(Message::assistant(format!("answer {idx}")));
            }
        }
        messages
    }

    pub fn non_system(messages: &[Message]) -> Vec<Message> {
        messages.iter().filter(|m| !m.is_system()).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_adapters::ScriptedAdapter;

    #[test]
    fn none_builds_nothing() {
        let config = ContextConfig::with_strategy(StrategyKind::None);
        assert!(build_strategy(&config, None).is_none());
    }

    #[test]
    fn model_strategies_require_adapter() {
        let config = ContextConfig::with_strategy(StrategyKind::Summary);
        assert!(matches!(
            try_build_strategy(&config, None),
            Err(ContextError::MissingAdapter {
                strategy: StrategyKind::Summary
            })
        ));

        let fallback = build_strategy(&config, None).unwrap();
        assert_eq!(fallback.name(), "sliding_window");
    }

    #[test]
    fn builds_each_kind() {
        let adapter: Arc<dyn ModelAdapter> = Arc::new(ScriptedAdapter::echo());
        for (kind, name) in [
            (StrategyKind::SlidingWindow, "sliding_window"),
            (StrategyKind::Summary, "summary"),
            (StrategyKind::SmartSelection, "smart_selection"),
        ] {
            let config = ContextConfig::with_strategy(kind);
            let strategy = build_strategy(&config, Some(Arc::clone(&adapter))).unwrap();
            assert_eq!(strategy.name(), name);
            assert_eq!(strategy.stats().strategy(), Some(name));
        }
    }

    #[test]
    fn partition_keeps_relative_order() {
        let messages = vec![
            Message::user("a"),
            Message::system("s1"),
            Message::assistant("b"),
            Message::system("s2"),
        ];
        let (system, rest) = partition(&messages);
        assert_eq!(system, vec![Message::system("s1"), Message::system("s2")]);
        assert_eq!(rest, vec![Message::user("a"), Message::assistant("b")]);
    }
}
