//! Stored conversation records.

use chat_primitives::{Conversation, ConversationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation as held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConversation {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Display name.
    pub name: String,
    /// Ordered messages.
    pub messages: Conversation,
    /// First save.
    pub created_at: DateTime<Utc>,
    /// Most recent save or update.
    pub updated_at: DateTime<Utc>,
}

impl StoredConversation {
    /// Listing entry for this conversation.
    #[must_use]
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            name: self.name.clone(),
            message_count: self.messages.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Listing entry returned by [`crate::ConversationStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Display name.
    pub name: String,
    /// Number of stored messages.
    pub message_count: usize,
    /// First save.
    pub created_at: DateTime<Utc>,
    /// Most recent save or update.
    pub updated_at: DateTime<Utc>,
}
