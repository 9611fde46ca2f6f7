use crate::conversation::{ConversationId, ConversationStore, StoredMessage};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    next_conversation: u64,
    next_message: u64,
    conversations: BTreeMap<ConversationId, Vec<StoredMessage>>,
}

/// In-memory implementation of ConversationStore
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    inner: RwLock<Inner>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(&self) -> Result<ConversationId, StorageError> {
        let mut inner = self.inner.write();
        inner.next_conversation += 1;
        let id = ConversationId::new(inner.next_conversation);
        inner.conversations.insert(id, Vec::new());
        debug!(conversation_id = %id, "Created conversation");
        Ok(id)
    }

    async fn conversation_exists(&self, id: ConversationId) -> Result<bool, StorageError> {
        Ok(self.inner.read().conversations.contains_key(&id))
    }

    async fn append_message(
        &self,
        id: ConversationId,
        sender: &str,
        text: &str,
    ) -> Result<StoredMessage, StorageError> {
        let mut inner = self.inner.write();
        inner.next_message += 1;
        let message = StoredMessage {
            id: inner.next_message,
            conversation_id: id,
            sender: sender.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        let messages = inner
            .conversations
            .get_mut(&id)
            .ok_or(StorageError::ConversationNotFound(id))?;
        messages.push(message.clone());
        Ok(message)
    }

    async fn list_recent_messages(
        &self,
        id: ConversationId,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, StorageError> {
        let inner = self.inner.read();
        let messages = inner
            .conversations
            .get(&id)
            .ok_or(StorageError::ConversationNotFound(id))?;
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn conversation_history(
        &self,
        id: ConversationId,
    ) -> Result<Option<Vec<StoredMessage>>, StorageError> {
        Ok(self.inner.read().conversations.get(&id).cloned())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
