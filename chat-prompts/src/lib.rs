//! Conversation-context governance.
//!
//! For every turn this crate decides how much history is sent to the model
//! ([`strategy`], [`context`]), which instruction frame wraps the request
//! ([`classifier`], [`template`]), and composes both with the input
//! guardrails in [`service::PromptService`].

#![warn(missing_docs, clippy::pedantic)]

pub mod classifier;
pub mod context;
pub mod lifecycle;
pub mod service;
pub mod strategy;
pub mod template;

pub use chat_primitives::PromptType;
pub use classifier::{ClassifyError, PromptClassifier};
pub use context::{ContextManager, ContextReport};
pub use lifecycle::{TurnError, TurnEvent, TurnLifecycle, TurnResult, TurnState};
pub use service::{BuiltPrompt, PreparedTurn, PromptOutcome, PromptService, Rejection, TurnOutcome};
pub use strategy::{
    ContextError, ContextResult, ContextStrategy, SlidingWindowStrategy, SmartSelectionStrategy,
    StrategyStats, SummaryStrategy, build_strategy, try_build_strategy,
};
pub use template::TemplateRegistry;
