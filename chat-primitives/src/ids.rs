//! Conversation identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key under which a conversation is stored and logged.
///
/// Minted by [`ConversationId::random`] when a session starts; a restored
/// session takes over the id of the stored record. Serializes as a bare
/// hyphenated UUID string.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
    /// Mints a fresh identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn stored_form_matches_display() {
        let id = ConversationId::random();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));

        let decoded: ConversationId = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn minted_ids_are_distinct_keys() {
        let keys: HashSet<ConversationId> = (0..32).map(|_| ConversationId::random()).collect();
        assert_eq!(keys.len(), 32);
    }
}
