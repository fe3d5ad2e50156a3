//! Conversation storage.
//!
//! The governance layer never persists conversations itself; hosts pass the
//! message log to a [`ConversationStore`]. [`InMemoryStore`] is the
//! in-process implementation, suitable for single-process hosts and tests.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod record;
pub mod store;
pub mod volatile;

pub use error::{StoreError, StoreResult};
pub use record::{ConversationSummary, StoredConversation};
pub use store::ConversationStore;
pub use volatile::InMemoryStore;
