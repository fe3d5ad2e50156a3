//! Storage contract consumed by hosts.

use async_trait::async_trait;
use chat_primitives::{Conversation, ConversationId};

use crate::record::{ConversationSummary, StoredConversation};
use crate::StoreResult;

/// Persists conversations on behalf of a host.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Creates or replaces a conversation. Returns `true` once stored.
    async fn save(
        &self,
        id: ConversationId,
        name: &str,
        messages: &Conversation,
    ) -> StoreResult<bool>;

    /// Loads a conversation, `None` when unknown.
    async fn load(&self, id: ConversationId) -> StoreResult<Option<StoredConversation>>;

    /// Lists every conversation, most recently updated first.
    async fn list(&self) -> StoreResult<Vec<ConversationSummary>>;

    /// Deletes a conversation. Returns `false` when it did not exist.
    async fn delete(&self, id: ConversationId) -> StoreResult<bool>;

    /// Replaces the messages of an existing conversation. Returns `false`
    /// when it does not exist.
    async fn update(&self, id: ConversationId, messages: &Conversation) -> StoreResult<bool>;
}
