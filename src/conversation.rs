//! Conversation persistence contract.
//!
//! The relay only needs a minimal CRUD surface from storage: create a
//! conversation, append a message, and read back a bounded window of the most
//! recent messages in creation order. Histories are append-only.

use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod memory;
pub mod persistence;

pub use memory::InMemoryConversationStore;
pub use persistence::SledConversationStore;

/// Sender tag used for messages typed by the customer.
pub const SENDER_USER: &str = "user";
/// Sender tag used for generated replies.
pub const SENDER_AI: &str = "ai";

/// Opaque conversation identifier, exposed to clients as the session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(u64);

impl ConversationId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn to_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(ConversationId)
    }
}

/// A message as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: u64,
    pub conversation_id: ConversationId,
    /// Raw sender tag; `"user"` for customers, anything else is the assistant.
    pub sender: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn is_from_user(&self) -> bool {
        self.sender == SENDER_USER
    }
}

/// Conversation metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub created_at: DateTime<Utc>,
}

/// Storage contract consumed by the chat service.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create an empty conversation and return its id
    async fn create_conversation(&self) -> Result<ConversationId, StorageError>;

    /// Whether a conversation with this id exists
    async fn conversation_exists(&self, id: ConversationId) -> Result<bool, StorageError>;

    /// Append a message; fails with `ConversationNotFound` for unknown ids
    async fn append_message(
        &self,
        id: ConversationId,
        sender: &str,
        text: &str,
    ) -> Result<StoredMessage, StorageError>;

    /// The `limit` most recent messages, oldest first
    async fn list_recent_messages(
        &self,
        id: ConversationId,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, StorageError>;

    /// Full history, oldest first, or `None` if the conversation does not exist
    async fn conversation_history(
        &self,
        id: ConversationId,
    ) -> Result<Option<Vec<StoredMessage>>, StorageError>;

    /// Cheap connectivity check used by health reporting
    async fn ping(&self) -> Result<(), StorageError>;
}

/// Shared handle to a store implementation
pub type ConversationStoreRef = Arc<dyn ConversationStore>;
