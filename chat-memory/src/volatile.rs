//! In-process conversation store.

use std::collections::HashMap;

use async_trait::async_trait;
use chat_primitives::{Conversation, ConversationId};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::record::{ConversationSummary, StoredConversation};
use crate::store::ConversationStore;
use crate::{StoreError, StoreResult};

/// Volatile store keeping conversations in a map for the process lifetime.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    conversations: RwLock<HashMap<ConversationId, StoredConversation>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// Returns `true` when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn save(
        &self,
        id: ConversationId,
        name: &str,
        messages: &Conversation,
    ) -> StoreResult<bool> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidRecord("conversation name must not be empty"));
        }

        let now = Utc::now();
        let mut guard = self.conversations.write().await;
        let created_at = guard.get(&id).map_or(now, |existing| existing.created_at);
        guard.insert(
            id,
            StoredConversation {
                id,
                name: name.to_owned(),
                messages: messages.clone(),
                created_at,
                updated_at: now,
            },
        );
        debug!(%id, messages = messages.len(), "conversation saved");
        Ok(true)
    }

    async fn load(&self, id: ConversationId) -> StoreResult<Option<StoredConversation>> {
        Ok(self.conversations.read().await.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<ConversationSummary>> {
        let guard = self.conversations.read().await;
        let mut summaries: Vec<ConversationSummary> =
            guard.values().map(StoredConversation::summary).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete(&self, id: ConversationId) -> StoreResult<bool> {
        let removed = self.conversations.write().await.remove(&id).is_some();
        if removed {
            debug!(%id, "conversation deleted");
        }
        Ok(removed)
    }

    async fn update(&self, id: ConversationId, messages: &Conversation) -> StoreResult<bool> {
        let mut guard = self.conversations.write().await;
        let Some(stored) = guard.get_mut(&id) else {
            return Ok(false);
        };
        stored.messages = messages.clone();
        stored.updated_at = Utc::now();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_primitives::Message;

    fn sample() -> Conversation {
        Conversation::from_messages(vec![
            Message::user("what is a trait?"),
            Message::assistant("a set of shared behavior"),
        ])
    }

    #[tokio::test]
    async fn save_load_delete() {
        let store = InMemoryStore::new();
        let id = ConversationId::random();

        assert!(store.save(id, "traits", &sample()).await.unwrap());
        let loaded = store.load(id).await.unwrap().expect("stored");
        assert_eq!(loaded.name, "traits");
        assert_eq!(loaded.messages, sample());

        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(store.load(id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_requires_existing_conversation() {
        let store = InMemoryStore::new();
        let id = ConversationId::random();
        assert!(!store.update(id, &sample()).await.unwrap());

        store.save(id, "traits", &Conversation::new()).await.unwrap();
        let created = store.load(id).await.unwrap().unwrap();
        assert!(store.update(id, &sample()).await.unwrap());

        let updated = store.load(id).await.unwrap().unwrap();
        assert_eq!(updated.messages.len(), 2);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryStore::new();
        let first = ConversationId::random();
        let second = ConversationId::random();
        let tick = std::time::Duration::from_millis(5);
        store.save(first, "first", &sample()).await.unwrap();
        tokio::time::sleep(tick).await;
        store.save(second, "second", &Conversation::new()).await.unwrap();
        tokio::time::sleep(tick).await;
        store.update(first, &sample()).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[0].message_count, 2);
        assert_eq!(listed[1].name, "second");
    }

    #[tokio::test]
    async fn rejects_blank_names() {
        let store = InMemoryStore::new();
        let err = store
            .save(ConversationId::random(), "  ", &sample())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }

    #[test]
    fn records_serialize_messages_inline() {
        let now = Utc::now();
        let record = StoredConversation {
            id: ConversationId::random(),
            name: "n".into(),
            messages: sample(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
