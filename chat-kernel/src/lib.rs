//! Per-conversation chat session.
//!
//! A [`ChatSession`] owns one conversation and drives every turn through the
//! guardrails, the prompt templates and the context strategy before handing
//! the request to the generation model. Replies come back as a
//! [`ReplyStream`] the host drains fragment by fragment.

#![warn(missing_docs, clippy::pedantic)]

mod session;

use chat_config::ConfigError;
use chat_policy::PolicyError;
use thiserror::Error;

pub use session::{ChatSession, ReplyStream, TurnReply};

/// Errors raised while assembling a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Guardrail patterns could not be built.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Result alias for session construction.
pub type SessionResult<T> = Result<T, SessionError>;
