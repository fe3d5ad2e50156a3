use std::sync::Arc;

use chat_adapters::{Fragment, FragmentStream, GenerationOptions, ModelAdapter, generate_response};
use chat_config::{AppConfig, ContextConfig};
use chat_primitives::{Conversation, ConversationId, Message, PromptType};
use chat_prompts::{
    ContextManager, ContextReport, PromptService, StrategyStats, TurnOutcome, build_strategy,
};
use chat_telemetry::{SessionSummary, TokenEstimator, UsageTracker};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::SessionResult;

/// Outcome of [`ChatSession::send`].
#[derive(Debug)]
pub enum TurnReply<'a> {
    /// The guardrails rejected the input. Carries the message to display.
    Rejected(String),
    /// The model is answering.
    Streaming(ReplyStream<'a>),
}

/// One conversation plus everything needed to run its turns.
pub struct ChatSession {
    id: ConversationId,
    conversation: Conversation,
    context: ContextManager,
    context_config: ContextConfig,
    prompts: PromptService,
    generation: Arc<dyn ModelAdapter>,
    helper: Option<Arc<dyn ModelAdapter>>,
    options: GenerationOptions,
    usage: UsageTracker,
    last_report: Option<ContextReport>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("messages", &self.conversation.len())
            .field("strategy", &self.context.strategy_name())
            .field("model", &self.generation.metadata().model())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Builds a session from configuration.
    ///
    /// `generation` answers the user. `helper`, when present, backs the
    /// summary and selection strategies, prompt classification and the
    /// model-assisted guardrail layer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SessionError::Config`] when `config` is invalid and
    /// [`crate::SessionError::Policy`] when the guardrail patterns fail to
    /// compile.
    pub fn from_config(
        config: &AppConfig,
        generation: Arc<dyn ModelAdapter>,
        helper: Option<Arc<dyn ModelAdapter>>,
    ) -> SessionResult<Self> {
        config.validate()?;

        let prompts = PromptService::from_config(config, helper.clone(), helper.clone())?;
        let estimator = TokenEstimator::new(config.model.name.clone());
        let strategy = build_strategy(&config.context, helper.clone());
        let options = GenerationOptions::default()
            .with_temperature(config.model.temperature)
            .with_max_tokens(config.model.max_tokens);

        let session = Self {
            id: ConversationId::random(),
            conversation: Conversation::new(),
            context: ContextManager::with_estimator(strategy, estimator.clone()),
            context_config: config.context.clone(),
            prompts,
            generation,
            helper,
            options,
            usage: UsageTracker::new(estimator),
            last_report: None,
        };
        debug!(
            id = %session.id,
            strategy = session.context.strategy_name(),
            guardrails = session.prompts.guardrails_enabled(),
            "session created"
        );
        Ok(session)
    }

    /// Seeds the conversation with a system message.
    #[must_use]
    pub fn with_system_prompt(mut self, text: impl Into<String>) -> Self {
        self.conversation.push(Message::system(text));
        self
    }

    /// Replaces the conversation, e.g. with one loaded from storage.
    pub fn restore(&mut self, id: ConversationId, conversation: Conversation) {
        debug!(%id, messages = conversation.len(), "conversation restored");
        self.id = id;
        self.conversation = conversation;
        self.last_report = None;
    }

    /// Conversation identifier.
    #[must_use]
    pub const fn id(&self) -> ConversationId {
        self.id
    }

    /// Messages exchanged so far.
    #[must_use]
    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Sampling settings forwarded with every generation request.
    #[must_use]
    pub const fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Token and cost totals for completed replies.
    #[must_use]
    pub fn usage_summary(&self) -> SessionSummary {
        self.usage.session_summary()
    }

    /// Counters of the active context strategy.
    #[must_use]
    pub fn strategy_stats(&self) -> Option<StrategyStats> {
        self.context.stats()
    }

    /// Savings report of the most recent accepted turn.
    #[must_use]
    pub const fn last_report(&self) -> Option<&ContextReport> {
        self.last_report.as_ref()
    }

    /// Empties the conversation.
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.last_report = None;
    }

    /// Rebuilds the context strategy, zeroing its counters.
    pub fn reset_strategy(&mut self) {
        let strategy = build_strategy(&self.context_config, self.helper.clone());
        self.context.set_strategy(strategy);
    }

    /// Runs a turn with automatic or pinned prompt type.
    pub async fn send(&mut self, input: &str) -> TurnReply<'_> {
        self.send_with_type(input, None).await
    }

    /// Runs a turn, framing the input with `prompt_type` when given.
    ///
    /// Rejected input leaves the conversation untouched and never reaches the
    /// generation model. Accepted input is appended as a user message before
    /// the request is issued.
    pub async fn send_with_type(
        &mut self,
        input: &str,
        prompt_type: Option<PromptType>,
    ) -> TurnReply<'_> {
        let outcome = self
            .prompts
            .prepare_turn(
                input,
                prompt_type,
                self.conversation.messages(),
                &mut self.context,
            )
            .await;

        let turn = match outcome {
            TurnOutcome::Rejected(rejection) => {
                warn!(id = %self.id, category = ?rejection.category, "turn rejected");
                return TurnReply::Rejected(rejection.message);
            }
            TurnOutcome::Ready(turn) => turn,
        };

        info!(
            id = %self.id,
            prompt_type = %turn.prompt.prompt_type,
            strategy = %turn.report.strategy,
            kept = turn.report.optimized_messages,
            tokens_saved = turn.report.tokens_saved,
            "turn prepared"
        );

        let estimator = self.context.estimator();
        let input_tokens =
            estimator.count_tokens(&turn.prompt.prompt) + estimator.count_messages(&turn.history);

        self.conversation.push(Message::user(input));
        self.last_report = Some(turn.report);

        let fragments = generate_response(
            self.generation.as_ref(),
            &turn.prompt.prompt,
            &turn.history,
            &self.options,
        )
        .await;

        TurnReply::Streaming(ReplyStream {
            session: self,
            fragments,
            buffer: String::new(),
            input_tokens,
            finished: false,
            failed: false,
        })
    }
}

/// Reply fragments of one turn.
///
/// The stream cannot be restarted. Call [`ReplyStream::commit`] to keep the
/// reply in the conversation; dropping it or calling
/// [`ReplyStream::discard`] leaves only the user message.
pub struct ReplyStream<'a> {
    session: &'a mut ChatSession,
    fragments: FragmentStream,
    buffer: String,
    input_tokens: usize,
    finished: bool,
    failed: bool,
}

impl std::fmt::Debug for ReplyStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyStream")
            .field("session", &self.session.id)
            .field("buffered", &self.buffer.len())
            .field("finished", &self.finished)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl ReplyStream<'_> {
    /// Next fragment, or `None` once the reply is complete.
    ///
    /// A generation failure arrives as one final [`Fragment::Error`];
    /// nothing follows it.
    pub async fn next_fragment(&mut self) -> Option<Fragment> {
        if self.finished {
            return None;
        }
        let Some(fragment) = self.fragments.next().await else {
            self.finished = true;
            return None;
        };
        if fragment.is_error() {
            self.finished = true;
            self.failed = true;
        }
        self.buffer.push_str(fragment.as_str());
        Some(fragment)
    }

    /// Reply text received so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Appends the reply received so far as an assistant message. An empty
    /// reply appends nothing.
    ///
    /// Usage is recorded only for replies that did not end in a generation
    /// error; the error text itself is kept so the conversation shows it.
    /// Returns the committed text.
    pub fn commit(self) -> String {
        let Self {
            session,
            buffer,
            input_tokens,
            finished,
            failed,
            ..
        } = self;

        if buffer.is_empty() {
            debug!(id = %session.id, "empty reply not committed");
            return buffer;
        }

        if !failed {
            let output_tokens = session.context.estimator().count_tokens(&buffer);
            session.usage.track_usage(input_tokens, output_tokens);
        }
        session.conversation.push(Message::assistant(buffer.clone()));
        debug!(
            id = %session.id,
            complete = finished,
            failed,
            "reply committed"
        );
        buffer
    }

    /// Drops the reply without touching the conversation.
    pub fn discard(self) {
        debug!(id = %self.session.id, buffered = self.buffer.len(), "reply discarded");
    }

    /// Drains every remaining fragment, then commits.
    pub async fn collect(mut self) -> String {
        while self.next_fragment().await.is_some() {}
        self.commit()
    }
}
