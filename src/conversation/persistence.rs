//! Sled-backed conversation store.
//!
//! Layout: the `conversations` tree maps a big-endian conversation id to its
//! [`ConversationRecord`]; each conversation owns a `messages/<id>` tree whose
//! keys are big-endian message ids. sled's `generate_id` is monotonic, so key
//! order equals creation order.

use crate::conversation::{ConversationId, ConversationRecord, ConversationStore, StoredMessage};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use tracing::debug;

const CONVERSATIONS_TREE: &str = "conversations";

/// Sled-based implementation of ConversationStore
pub struct SledConversationStore {
    db: sled::Db,
    conversations: sled::Tree,
}

impl SledConversationStore {
    /// Open (or create) a store at the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref()).map_err(|e| {
            StorageError::Backend(format!(
                "Failed to open sled database at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let conversations = db.open_tree(CONVERSATIONS_TREE)?;
        Ok(Self { db, conversations })
    }

    /// Temporary store that is removed on drop
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        let conversations = db.open_tree(CONVERSATIONS_TREE)?;
        Ok(Self { db, conversations })
    }

    fn messages_tree(&self, id: ConversationId) -> Result<sled::Tree, StorageError> {
        Ok(self.db.open_tree(format!("messages/{}", id))?)
    }

    fn require_conversation(&self, id: ConversationId) -> Result<(), StorageError> {
        if self.conversations.contains_key(id.to_key())? {
            Ok(())
        } else {
            Err(StorageError::ConversationNotFound(id))
        }
    }

    fn decode_messages<I>(iter: I) -> Result<Vec<StoredMessage>, StorageError>
    where
        I: Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
    {
        iter.map(|item| {
            let (_, value) = item?;
            Ok(bincode::deserialize::<StoredMessage>(&value)?)
        })
        .collect()
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for SledConversationStore {
    async fn create_conversation(&self) -> Result<ConversationId, StorageError> {
        // generate_id starts at zero; session ids are positive
        let id = ConversationId::new(self.db.generate_id()? + 1);
        let record = ConversationRecord {
            id,
            created_at: Utc::now(),
        };
        self.conversations
            .insert(id.to_key(), bincode::serialize(&record)?)?;
        debug!(conversation_id = %id, "Created conversation");
        Ok(id)
    }

    async fn conversation_exists(&self, id: ConversationId) -> Result<bool, StorageError> {
        Ok(self.conversations.contains_key(id.to_key())?)
    }

    async fn append_message(
        &self,
        id: ConversationId,
        sender: &str,
        text: &str,
    ) -> Result<StoredMessage, StorageError> {
        self.require_conversation(id)?;
        let message = StoredMessage {
            id: self.db.generate_id()?,
            conversation_id: id,
            sender: sender.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.messages_tree(id)?
            .insert(message.id.to_be_bytes(), bincode::serialize(&message)?)?;
        Ok(message)
    }

    async fn list_recent_messages(
        &self,
        id: ConversationId,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, StorageError> {
        self.require_conversation(id)?;
        let mut recent = Self::decode_messages(self.messages_tree(id)?.iter().rev().take(limit))?;
        recent.reverse();
        Ok(recent)
    }

    async fn conversation_history(
        &self,
        id: ConversationId,
    ) -> Result<Option<Vec<StoredMessage>>, StorageError> {
        if !self.conversations.contains_key(id.to_key())? {
            return Ok(None);
        }
        Self::decode_messages(self.messages_tree(id)?.iter()).map(Some)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.conversations.first()?;
        Ok(())
    }
}
