use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::SessionStore;
use crate::agent::types::ConversationSession;
use crate::core::errors::ApiError;

/// Process-lifetime session map. Entries are lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: ConversationSession) -> Result<(), ApiError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<ConversationSession>, ApiError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn remove(&self, session_id: &str) -> Result<bool, ApiError> {
        Ok(self.sessions.write().await.remove(session_id).is_some())
    }
}
