use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use chat_adapters::{AdapterError, AdapterResult, ModelAdapter, complete};
use chat_primitives::Message;
use tracing::{debug, warn};

use super::{ContextStrategy, StrategyStats, partition, reassemble, tail};

/// Prefix of the synthetic message that replaces summarized history.
pub const SUMMARY_MARKER: &str = "📝 Summary of earlier conversation:";

/// Summarizes older history through a model and keeps recent messages.
pub struct SummaryStrategy {
    adapter: Arc<dyn ModelAdapter>,
    keep_recent: usize,
    summarize_threshold: usize,
    invocations: u64,
    optimizations: u64,
    summaries: u64,
    fallbacks: u64,
}

impl std::fmt::Debug for SummaryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryStrategy")
            .field("keep_recent", &self.keep_recent)
            .field("summarize_threshold", &self.summarize_threshold)
            .field("optimizations", &self.optimizations)
            .finish_non_exhaustive()
    }
}

impl SummaryStrategy {
    /// Creates a strategy that summarizes once the non-system message count
    /// exceeds `summarize_threshold`, keeping the last `keep_recent` verbatim.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>, keep_recent: usize, summarize_threshold: usize) -> Self {
        Self {
            adapter,
            keep_recent,
            summarize_threshold,
            invocations: 0,
            optimizations: 0,
            summaries: 0,
            fallbacks: 0,
        }
    }

    async fn summarize(&self, old: &[Message]) -> AdapterResult<String> {
        let summary = complete(self.adapter.as_ref(), &summary_prompt(old)).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(AdapterError::response("summarizer returned an empty reply"));
        }
        Ok(summary.to_owned())
    }
}

fn summary_prompt(old: &[Message]) -> String {
    let mut prompt = String::from(
        "Summarize the following conversation in at most 200 words. \
Focus on the technical concepts discussed, the decisions made and any code \
that was shared.\n\nConversation:\n",
    );
    for message in old {
        let _ = writeln!(prompt, "{}: {}", message.role(), message.text());
    }
    prompt.push_str("\nSummary:");
    prompt
}

fn placeholder(omitted: usize) -> String {
    format!("[{omitted} earlier messages were omitted to save context.]")
}

#[async_trait]
impl ContextStrategy for SummaryStrategy {
    fn name(&self) -> &'static str {
        "summary"
    }

    async fn optimize(&mut self, messages: &[Message], _new_query: &str) -> Vec<Message> {
        self.invocations += 1;
        let (system, others) = partition(messages);
        if others.len() <= self.summarize_threshold {
            return messages.to_vec();
        }

        let split = others.len().saturating_sub(self.keep_recent);
        let old = &others[..split];
        if old.is_empty() {
            return messages.to_vec();
        }
        let recent = tail(&others, self.keep_recent);

        let summary = match self.summarize(old).await {
            Ok(summary) => {
                self.summaries += 1;
                summary
            }
            Err(err) => {
                self.fallbacks += 1;
                warn!(strategy = "summary", error = %err, "summarization failed, using placeholder");
                placeholder(old.len())
            }
        };

        self.optimizations += 1;
        debug!(
            strategy = "summary",
            summarized = old.len(),
            kept = recent.len(),
            "compacted history"
        );

        let summary_message = Message::system(format!("{SUMMARY_MARKER}\n\n{summary}"));
        reassemble(system, std::iter::once(summary_message).chain(recent))
    }

    fn stats(&self) -> StrategyStats {
        StrategyStats::new(self.name())
            .with("keep_recent", self.keep_recent)
            .with("summarize_threshold", self.summarize_threshold)
            .with("invocations", self.invocations)
            .with("optimizations_count", self.optimizations)
            .with("summaries_generated", self.summaries)
            .with("summary_fallbacks", self.fallbacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{conversation, non_system};
    use chat_adapters::ScriptedAdapter;

    #[tokio::test]
    async fn replaces_old_prefix_with_summary() {
        let adapter = Arc::new(ScriptedAdapter::new(["They discussed ownership."]));
        let mut strategy = SummaryStrategy::new(Arc::clone(&adapter) as Arc<dyn ModelAdapter>, 3, 7);
        let messages = conversation(8);

        let optimized = strategy.optimize(&messages, "next").await;

        assert_eq!(optimized.len(), 5);
        assert_eq!(optimized[0], messages[0]);
        assert!(optimized[1].is_system());
        assert!(optimized[1].text().starts_with(SUMMARY_MARKER));
        assert!(optimized[1].text().ends_with("They discussed ownership."));
        assert_eq!(optimized[2..].to_vec(), non_system(&messages)[5..].to_vec());

        let request = &adapter.requests()[0];
        let prompt = request.prompt().unwrap();
        assert!(prompt.contains("user: question 0"));
        assert!(!prompt.contains("answer 7"));
    }

    #[tokio::test]
    async fn at_threshold_is_identity() {
        let adapter = Arc::new(ScriptedAdapter::new(["unused"]));
        let mut strategy = SummaryStrategy::new(Arc::clone(&adapter) as Arc<dyn ModelAdapter>, 3, 7);
        let messages = conversation(7);

        assert_eq!(strategy.optimize(&messages, "q").await, messages);
        assert_eq!(strategy.optimize(&messages, "q").await, messages);
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn failure_falls_back_to_placeholder() {
        let adapter: Arc<dyn ModelAdapter> = Arc::new(ScriptedAdapter::failing("quota"));
        let mut strategy = SummaryStrategy::new(adapter, 3, 7);

        let optimized = strategy.optimize(&conversation(10), "q").await;

        assert_eq!(optimized.len(), 5);
        assert!(optimized[1].text().contains("7 earlier messages were omitted"));
        let stats = strategy.stats();
        assert_eq!(stats.count("summary_fallbacks"), Some(1));
        assert_eq!(stats.count("summaries_generated"), Some(0));
    }

    #[tokio::test]
    async fn empty_summary_counts_as_failure() {
        let adapter: Arc<dyn ModelAdapter> = Arc::new(ScriptedAdapter::new(["   "]));
        let mut strategy = SummaryStrategy::new(adapter, 2, 4);

        let optimized = strategy.optimize(&conversation(6), "q").await;

        assert!(optimized[1].text().contains("4 earlier messages were omitted"));
    }

    #[tokio::test]
    async fn interleaved_system_messages_precede_the_summary() {
        let adapter: Arc<dyn ModelAdapter> = Arc::new(ScriptedAdapter::new(["early talk"]));
        let mut strategy = SummaryStrategy::new(adapter, 2, 4);
        let messages = vec![
            Message::system("rules"),
            Message::user("q0"),
            Message::assistant("a0"),
            Message::system("late rules"),
            Message::user("q1"),
            Message::assistant("a1"),
            Message::user("q2"),
            Message::assistant("a2"),
            Message::system("style"),
        ];

        let optimized = strategy.optimize(&messages, "q").await;

        assert_eq!(optimized.len(), 6);
        assert_eq!(
            optimized[..3].to_vec(),
            vec![
                Message::system("rules"),
                Message::system("late rules"),
                Message::system("style"),
            ]
        );
        assert!(optimized[3].is_system());
        assert!(optimized[3].text().starts_with(SUMMARY_MARKER));
        assert_eq!(
            optimized[4..].to_vec(),
            vec![Message::user("q2"), Message::assistant("a2")]
        );
    }

    #[tokio::test]
    async fn stats_accumulate() {
        let adapter: Arc<dyn ModelAdapter> = Arc::new(ScriptedAdapter::new(["summary"]));
        let mut strategy = SummaryStrategy::new(adapter, 2, 4);
        strategy.optimize(&conversation(6), "q").await;
        strategy.optimize(&conversation(3), "q").await;
        strategy.optimize(&conversation(9), "q").await;

        let stats = strategy.stats();
        assert_eq!(stats.count("invocations"), Some(3));
        assert_eq!(stats.count("optimizations_count"), Some(2));
        assert_eq!(stats.count("summaries_generated"), Some(2));
        assert_eq!(stats.count("keep_recent"), Some(2));
    }
}
