use async_trait::async_trait;
use chat_primitives::Message;
use tracing::debug;

use super::{ContextStrategy, StrategyStats, partition, reassemble, tail};

/// Keeps only the most recent `max_messages` non-system messages.
#[derive(Debug, Clone)]
pub struct SlidingWindowStrategy {
    max_messages: usize,
    invocations: u64,
    optimizations: u64,
    total_kept: u64,
}

impl SlidingWindowStrategy {
    /// Creates a window of `max_messages` non-system messages.
    #[must_use]
    pub const fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            invocations: 0,
            optimizations: 0,
            total_kept: 0,
        }
    }

    /// Configured window size.
    #[must_use]
    pub const fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Synchronous core of [`ContextStrategy::optimize`].
    pub fn apply(&mut self, messages: &[Message]) -> Vec<Message> {
        self.invocations += 1;
        let (system, others) = partition(messages);
        if others.len() <= self.max_messages {
            return messages.to_vec();
        }

        let recent = tail(&others, self.max_messages);
        self.optimizations += 1;
        self.total_kept += recent.len() as u64;
        debug!(
            strategy = "sliding_window",
            dropped = others.len() - recent.len(),
            kept = recent.len(),
            "trimmed history"
        );
        reassemble(system, recent)
    }
}

#[async_trait]
impl ContextStrategy for SlidingWindowStrategy {
    fn name(&self) -> &'static str {
        "sliding_window"
    }

    async fn optimize(&mut self, messages: &[Message], _new_query: &str) -> Vec<Message> {
        self.apply(messages)
    }

    #[allow(clippy::cast_precision_loss)]
    fn stats(&self) -> StrategyStats {
        let average = self.total_kept as f64 / self.optimizations.max(1) as f64;
        StrategyStats::new(self.name())
            .with("max_messages", self.max_messages)
            .with("invocations", self.invocations)
            .with("optimizations_count", self.optimizations)
            .with("total_messages_kept", self.total_kept)
            .with("average_messages_kept", average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{conversation, non_system};

    #[tokio::test]
    async fn keeps_last_window() {
        let messages = conversation(11);
        let mut strategy = SlidingWindowStrategy::new(5);

        let optimized = strategy.optimize(&messages, "next").await;

        assert_eq!(optimized.len(), 6);
        assert_eq!(optimized[0], messages[0]);
        assert_eq!(non_system(&optimized), non_system(&messages)[6..].to_vec());
    }

    #[tokio::test]
    async fn short_history_is_identity() {
        let mut strategy = SlidingWindowStrategy::new(5);
        for turns in 0..=5 {
            let messages = conversation(turns);
            assert_eq!(strategy.optimize(&messages, "q").await, messages);
        }
        assert_eq!(strategy.stats().count("optimizations_count"), Some(0));
    }

    #[tokio::test]
    async fn optimizing_twice_is_stable() {
        let mut strategy = SlidingWindowStrategy::new(4);
        let once = strategy.optimize(&conversation(9), "q").await;
        let twice = strategy.optimize(&once, "q").await;
        let thrice = strategy.optimize(&twice, "q").await;
        assert_eq!(once, twice);
        assert_eq!(twice, thrice);
    }

    #[tokio::test]
    async fn interleaved_system_messages_move_to_front() {
        let messages = vec![
            Message::system("rules"),
            Message::user("u1"),
            Message::system("late rules"),
            Message::assistant("a1"),
            Message::user("u2"),
        ];
        let mut strategy = SlidingWindowStrategy::new(2);

        let optimized = strategy.optimize(&messages, "q").await;

        assert_eq!(
            optimized,
            vec![
                Message::system("rules"),
                Message::system("late rules"),
                Message::assistant("a1"),
                Message::user("u2"),
            ]
        );
    }

    #[tokio::test]
    async fn stats_accumulate_across_calls() {
        let mut strategy = SlidingWindowStrategy::new(3);
        strategy.optimize(&conversation(8), "q").await;
        strategy.optimize(&conversation(10), "q").await;
        strategy.optimize(&conversation(2), "q").await;

        let stats = strategy.stats();
        assert_eq!(stats.count("invocations"), Some(3));
        assert_eq!(stats.count("optimizations_count"), Some(2));
        assert_eq!(stats.count("total_messages_kept"), Some(6));
        assert_eq!(
            stats.get("average_messages_kept").and_then(|v| v.as_f64()),
            Some(3.0)
        );
    }
}
