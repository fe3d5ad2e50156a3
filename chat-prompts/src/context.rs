//! Context preparation with token and cost accounting.

use chat_primitives::Message;
use chat_telemetry::TokenEstimator;
use serde::Serialize;
use tracing::debug;

use crate::strategy::{ContextStrategy, StrategyStats};

/// Before/after figures for one context preparation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContextReport {
    /// Messages before optimization.
    pub original_messages: usize,
    /// Messages after optimization.
    pub optimized_messages: usize,
    /// Estimated tokens before optimization.
    pub original_tokens: usize,
    /// Estimated tokens after optimization.
    pub optimized_tokens: usize,
    /// `original_tokens - optimized_tokens`, saturating at zero.
    pub tokens_saved: usize,
    /// Token reduction in percent; zero when there was nothing to reduce.
    pub reduction_percent: f64,
    /// Input cost of the original history.
    pub original_cost: f64,
    /// Input cost of the optimized history.
    pub optimized_cost: f64,
    /// `original_cost - optimized_cost`.
    pub cost_saved: f64,
    /// Cost reduction in percent; zero when the original cost is zero.
    pub cost_reduction_percent: f64,
    /// Strategy that produced the optimized history.
    pub strategy: String,
}

fn percent(saved: f64, original: f64) -> f64 {
    if original > 0.0 {
        saved / original * 100.0
    } else {
        0.0
    }
}

/// Runs a context strategy and reports how much it saved.
///
/// # Examples
///
/// ```
/// use chat_primitives::Message;
/// use chat_prompts::context::ContextManager;
/// use chat_prompts::strategy::SlidingWindowStrategy;
///
/// # tokio_test_block_on(async {
/// let mut manager = ContextManager::new(Some(Box::new(SlidingWindowStrategy::new(1))));
/// let history = vec![Message::user("one two"), Message::assistant("three")];
/// let (kept, report) = manager.prepare_context(&history, "four").await;
/// assert_eq!(kept, vec![Message::assistant("three")]);
/// assert_eq!(report.strategy, "sliding_window");
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct ContextManager {
    strategy: Option<Box<dyn ContextStrategy>>,
    estimator: TokenEstimator,
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("strategy", &self.strategy_name())
            .field("estimator", &self.estimator)
            .finish()
    }
}

impl ContextManager {
    /// Creates a manager priced with the default model.
    #[must_use]
    pub fn new(strategy: Option<Box<dyn ContextStrategy>>) -> Self {
        Self::with_estimator(strategy, TokenEstimator::default())
    }

    /// Creates a manager with an explicit estimator.
    #[must_use]
    pub fn with_estimator(
        strategy: Option<Box<dyn ContextStrategy>>,
        estimator: TokenEstimator,
    ) -> Self {
        Self {
            strategy,
            estimator,
        }
    }

    /// Name of the active strategy, `"none"` when history passes through.
    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.as_ref().map_or("none", |s| s.name())
    }

    /// Counters of the active strategy.
    #[must_use]
    pub fn stats(&self) -> Option<StrategyStats> {
        self.strategy.as_ref().map(|s| s.stats())
    }

    /// Replaces the active strategy, discarding its counters.
    pub fn set_strategy(&mut self, strategy: Option<Box<dyn ContextStrategy>>) {
        self.strategy = strategy;
    }

    /// Token estimator used for the report.
    #[must_use]
    pub const fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    /// Optimizes `messages` for `new_query` and reports the savings.
    pub async fn prepare_context(
        &mut self,
        messages: &[Message],
        new_query: &str,
    ) -> (Vec<Message>, ContextReport) {
        let optimized = match self.strategy.as_mut() {
            Some(strategy) => strategy.optimize(messages, new_query).await,
            None => messages.to_vec(),
        };
        let report = self.report(messages, &optimized);
        debug!(
            strategy = %report.strategy,
            messages_before = report.original_messages,
            messages_after = report.optimized_messages,
            tokens_saved = report.tokens_saved,
            "context prepared"
        );
        (optimized, report)
    }

    /// Computes the report for an already optimized history.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn report(&self, original: &[Message], optimized: &[Message]) -> ContextReport {
        let original_tokens = self.estimator.count_messages(original);
        let optimized_tokens = self.estimator.count_messages(optimized);
        let tokens_saved = original_tokens.saturating_sub(optimized_tokens);
        let original_cost = self.estimator.calculate_cost(original_tokens, 0);
        let optimized_cost = self.estimator.calculate_cost(optimized_tokens, 0);
        let cost_saved = original_cost - optimized_cost;

        ContextReport {
            original_messages: original.len(),
            optimized_messages: optimized.len(),
            original_tokens,
            optimized_tokens,
            tokens_saved,
            reduction_percent: percent(tokens_saved as f64, original_tokens as f64),
            original_cost,
            optimized_cost,
            cost_saved,
            cost_reduction_percent: percent(cost_saved, original_cost),
            strategy: self.strategy_name().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::SlidingWindowStrategy;
    use crate::strategy::test_support::conversation;

    #[tokio::test]
    async fn reports_savings() {
        let mut manager = ContextManager::new(Some(Box::new(SlidingWindowStrategy::new(2))));
        let messages = conversation(6);

        let (optimized, report) = manager.prepare_context(&messages, "q").await;

        assert_eq!(optimized.len(), 3);
        assert_eq!(report.original_messages, 7);
        assert_eq!(report.optimized_messages, 3);
        assert!(report.tokens_saved > 0);
        assert_eq!(report.original_tokens - report.optimized_tokens, report.tokens_saved);
        assert!(report.reduction_percent > 0.0 && report.reduction_percent < 100.0);
        assert!((report.cost_saved - (report.original_cost - report.optimized_cost)).abs() < 1e-12);
        assert_eq!(report.strategy, "sliding_window");
        assert_eq!(manager.stats().unwrap().count("optimizations_count"), Some(1));
    }

    #[tokio::test]
    async fn no_strategy_passes_through() {
        let mut manager = ContextManager::new(None);
        let messages = conversation(12);

        let (optimized, report) = manager.prepare_context(&messages, "q").await;

        assert_eq!(optimized, messages);
        assert_eq!(report.tokens_saved, 0);
        assert!(report.reduction_percent.abs() < f64::EPSILON);
        assert_eq!(report.strategy, "none");
        assert!(manager.stats().is_none());
    }

    #[tokio::test]
    async fn empty_history_has_zero_percentages() {
        let mut manager = ContextManager::new(Some(Box::new(SlidingWindowStrategy::new(2))));
        let (optimized, report) = manager.prepare_context(&[], "q").await;

        assert!(optimized.is_empty());
        assert_eq!(report.original_tokens, 0);
        assert!(report.reduction_percent.abs() < f64::EPSILON);
        assert!(report.cost_reduction_percent.abs() < f64::EPSILON);
    }
}
