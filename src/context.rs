//! Context Builder
//!
//! Turns a window of stored messages into the role-tagged turns sent to the
//! provider as prior conversation. Pure: the stored history is only read.

use crate::conversation::{StoredMessage, SENDER_USER};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Default number of most-recent messages forwarded as context.
pub const DEFAULT_CONTEXT_LIMIT: usize = 10;

/// Conversation role as seen by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a raw sender tag: `"user"` is the customer, anything else the assistant.
    pub fn from_sender(sender: &str) -> Self {
        if sender == SENDER_USER {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

/// Text that contains at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Returns `None` for empty or whitespace-only input. The text is kept as given.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for NonEmptyText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        NonEmptyText::new(value).ok_or_else(|| "text must not be empty".to_string())
    }
}

impl From<NonEmptyText> for String {
    fn from(value: NonEmptyText) -> Self {
        value.0
    }
}

/// One role-tagged unit of prior conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: NonEmptyText,
}

/// Build prompt context from stored history.
///
/// `history` must already be ascending by creation time; it is not re-sorted.
/// At most the `limit` newest entries are kept, blank entries are dropped.
pub fn build(history: &[StoredMessage], limit: usize) -> Vec<ConversationTurn> {
    let start = history.len().saturating_sub(limit);
    history[start..]
        .iter()
        .filter_map(|message| {
            NonEmptyText::new(message.text.as_str()).map(|content| ConversationTurn {
                role: Role::from_sender(&message.sender),
                content,
            })
        })
        .collect()
}
