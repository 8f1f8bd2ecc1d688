//! Conversation session storage.
//!
//! `SessionStore` abstracts where sessions live so the agent service can be
//! backed by process memory (the default) or by a durable store.

mod memory;

pub use memory::InMemorySessionStore;

use async_trait::async_trait;

use crate::agent::types::ConversationSession;
use crate::core::errors::ApiError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a session, replacing any existing entry with the same id.
    async fn insert(&self, session: ConversationSession) -> Result<(), ApiError>;

    /// Look up a session. Unknown ids yield `Ok(None)`.
    async fn get(&self, session_id: &str) -> Result<Option<ConversationSession>, ApiError>;

    /// Remove a session, reporting whether anything was removed.
    async fn remove(&self, session_id: &str) -> Result<bool, ApiError>;
}
