//! Core shared types for the conversation governance layer.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod message;
mod prompt_type;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifier for a stored conversation.
pub use ids::ConversationId;
/// Chat roles, messages, and the ordered conversation log.
pub use message::{Conversation, Message, Role};
/// Intent categories used to pick an instruction template.
pub use prompt_type::PromptType;
