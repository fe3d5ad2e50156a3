use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use chat_adapters::{AdapterError, AdapterResult, ModelAdapter, complete};
use chat_primitives::Message;
use tracing::{debug, warn};

use super::{ContextStrategy, StrategyStats, partition, reassemble, tail};

/// Characters of each message shown to the selector model.
pub const PREVIEW_CHARS: usize = 150;

/// Asks a model which earlier messages matter for the next query.
pub struct SmartSelectionStrategy {
    adapter: Arc<dyn ModelAdapter>,
    max_selected: usize,
    invocations: u64,
    optimizations: u64,
    total_selected: u64,
    fallbacks: u64,
}

impl std::fmt::Debug for SmartSelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartSelectionStrategy")
            .field("max_selected", &self.max_selected)
            .field("optimizations", &self.optimizations)
            .finish_non_exhaustive()
    }
}

impl SmartSelectionStrategy {
    /// Creates a strategy that keeps at most `max_selected` exchanges
    /// (`max_selected * 2` messages).
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>, max_selected: usize) -> Self {
        Self {
            adapter,
            max_selected,
            invocations: 0,
            optimizations: 0,
            total_selected: 0,
            fallbacks: 0,
        }
    }

    const fn budget(&self) -> usize {
        self.max_selected.saturating_mul(2)
    }

    async fn select(&self, others: &[Message], new_query: &str) -> AdapterResult<Vec<usize>> {
        let prompt = selection_prompt(others, new_query, self.max_selected);
        let reply = complete(self.adapter.as_ref(), &prompt).await?;
        let indices = parse_indices(&reply, others.len());
        if indices.is_empty() {
            return Err(AdapterError::response(format!(
                "no valid message index in selector reply `{}`",
                reply.trim()
            )));
        }
        Ok(indices)
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn selection_prompt(others: &[Message], new_query: &str, max_selected: usize) -> String {
    let mut prompt = String::from("Conversation so far:\n");
    for (idx, message) in others.iter().enumerate() {
        let _ = writeln!(prompt, "[{idx}] {}: {}", message.role(), preview(message.text()));
    }
    let _ = write!(
        prompt,
        "\nNew question: {new_query}\n\n\
Which of the messages above are most relevant to answer the new question? \
Choose at most {max_selected} exchanges. Reply only with the message numbers \
separated by commas, for example: 0, 3, 4"
    );
    prompt
}

/// Extracts valid, de-duplicated, ascending indices below `len` from a
/// comma-separated reply. Tokens that are not plain numbers are skipped.
#[must_use]
pub fn parse_indices(reply: &str, len: usize) -> Vec<usize> {
    reply
        .split(',')
        .map(|token| token.trim_matches(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '.')))
        .filter(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|token| token.parse::<usize>().ok())
        .filter(|idx| *idx < len)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[async_trait]
impl ContextStrategy for SmartSelectionStrategy {
    fn name(&self) -> &'static str {
        "smart_selection"
    }

    async fn optimize(&mut self, messages: &[Message], new_query: &str) -> Vec<Message> {
        self.invocations += 1;
        let (system, others) = partition(messages);
        let budget = self.budget();
        if others.len() <= budget {
            return messages.to_vec();
        }

        let selected = match self.select(&others, new_query).await {
            Ok(indices) => {
                let indices = tail(&indices, budget);
                debug!(strategy = "smart_selection", ?indices, "selected relevant messages");
                indices.into_iter().map(|idx| others[idx].clone()).collect()
            }
            Err(err) => {
                self.fallbacks += 1;
                warn!(strategy = "smart_selection", error = %err, "selection failed, keeping most recent");
                tail(&others, budget)
            }
        };

        self.optimizations += 1;
        self.total_selected += selected.len() as u64;
        reassemble(system, selected)
    }

    fn stats(&self) -> StrategyStats {
        StrategyStats::new(self.name())
            .with("max_selected", self.max_selected)
            .with("invocations", self.invocations)
            .with("optimizations_count", self.optimizations)
            .with("total_messages_selected", self.total_selected)
            .with("selection_fallbacks", self.fallbacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{conversation, non_system};
    use chat_adapters::ScriptedAdapter;

    #[test]
    fn parses_only_numeric_in_range_tokens() {
        assert_eq!(parse_indices("0, 3, 4", 10), vec![0, 3, 4]);
        assert_eq!(parse_indices("4,abc,2,-1,99,2", 10), vec![2, 4]);
        assert_eq!(parse_indices("[1, 2].", 10), vec![1, 2]);
        assert_eq!(parse_indices("1.5, two", 10), Vec::<usize>::new());
        assert_eq!(parse_indices("", 10), Vec::<usize>::new());
        assert_eq!(parse_indices("99999999999999999999999", 10), Vec::<usize>::new());
    }

    #[test]
    fn previews_are_truncated() {
        let long = "x".repeat(PREVIEW_CHARS + 10);
        assert_eq!(preview(&long).chars().count(), PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }

    #[tokio::test]
    async fn keeps_selected_messages_in_order() {
        let adapter = Arc::new(ScriptedAdapter::new(["7, 1, 2"]));
        let mut strategy =
            SmartSelectionStrategy::new(Arc::clone(&adapter) as Arc<dyn ModelAdapter>, 2);
        let messages = conversation(10);
        let others = non_system(&messages);

        let optimized = strategy.optimize(&messages, "what about traits?").await;

        assert_eq!(
            optimized,
            vec![
                messages[0].clone(),
                others[1].clone(),
                others[2].clone(),
                others[7].clone(),
            ]
        );
        let prompt = adapter.requests()[0].prompt().unwrap().to_owned();
        assert!(prompt.contains("[9] assistant: answer 9"));
        assert!(prompt.contains("New question: what about traits?"));
    }

    #[tokio::test]
    async fn selection_is_capped_to_most_recent() {
        let adapter: Arc<dyn ModelAdapter> =
            Arc::new(ScriptedAdapter::new(["0, 1, 2, 3, 4, 5, 6"]));
        let mut strategy = SmartSelectionStrategy::new(adapter, 2);
        let messages = conversation(10);

        let optimized = strategy.optimize(&messages, "q").await;

        assert_eq!(non_system(&optimized), non_system(&messages)[3..7].to_vec());
    }

    #[tokio::test]
    async fn malformed_reply_falls_back_to_tail() {
        let adapter: Arc<dyn ModelAdapter> =
            Arc::new(ScriptedAdapter::new(["the first and the third"]));
        let mut strategy = SmartSelectionStrategy::new(adapter, 2);
        let messages = conversation(10);

        let optimized = strategy.optimize(&messages, "q").await;

        assert_eq!(optimized[0], messages[0]);
        assert_eq!(non_system(&optimized), non_system(&messages)[6..].to_vec());
        assert_eq!(strategy.stats().count("selection_fallbacks"), Some(1));
    }

    #[tokio::test]
    async fn adapter_failure_falls_back_to_tail() {
        let adapter: Arc<dyn ModelAdapter> = Arc::new(ScriptedAdapter::failing("down"));
        let mut strategy = SmartSelectionStrategy::new(adapter, 3);
        let messages = conversation(12);

        let optimized = strategy.optimize(&messages, "q").await;

        assert_eq!(non_system(&optimized), non_system(&messages)[6..].to_vec());
    }

    #[tokio::test]
    async fn interleaved_system_messages_keep_their_order() {
        let adapter: Arc<dyn ModelAdapter> = Arc::new(ScriptedAdapter::new(["4, 1"]));
        let mut strategy = SmartSelectionStrategy::new(adapter, 1);
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

        assert_eq!(
            optimized,
            vec![
                Message::system("rules"),
                Message::system("late rules"),
                Message::system("style"),
                Message::assistant("a0"),
                Message::user("q2"),
            ]
        );
    }

    #[tokio::test]
    async fn short_history_skips_model() {
        let adapter = Arc::new(ScriptedAdapter::new(["0"]));
        let mut strategy =
            SmartSelectionStrategy::new(Arc::clone(&adapter) as Arc<dyn ModelAdapter>, 4);
        let messages = conversation(8);

        assert_eq!(strategy.optimize(&messages, "q").await, messages);
        assert_eq!(strategy.optimize(&messages, "q").await, messages);
        assert_eq!(adapter.calls(), 0);
        assert_eq!(strategy.stats().count("invocations"), Some(2));
    }
}
