//! Chat service: session handling and persistence around the orchestrator.

use crate::context::DEFAULT_CONTEXT_LIMIT;
use crate::conversation::{
    ConversationId, ConversationStoreRef, StoredMessage, SENDER_AI, SENDER_USER,
};
use crate::error::RelayError;
use crate::generation::{CustomerMessage, ResponseOrchestrator};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Reply to one customer message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    pub session_id: ConversationId,
}

/// One entry of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMessage {
    /// `"user"` or `"ai"`
    pub role: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredMessage> for HistoryMessage {
    fn from(message: StoredMessage) -> Self {
        let role = if message.is_from_user() {
            SENDER_USER
        } else {
            SENDER_AI
        };
        Self {
            role: role.to_string(),
            text: message.text,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationHistory {
    pub session_id: ConversationId,
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// `"healthy"` or `"unhealthy"`
    pub status: String,
    /// `"connected"` or `"disconnected"`
    pub database: String,
    pub timestamp: String,
    pub provider: String,
    pub model: String,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }

    pub fn status_code(&self) -> u16 {
        if self.is_healthy() {
            200
        } else {
            503
        }
    }
}

pub struct ChatService {
    store: ConversationStoreRef,
    orchestrator: ResponseOrchestrator,
}

impl ChatService {
    pub fn new(store: ConversationStoreRef, orchestrator: ResponseOrchestrator) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Answer `message` within `session`, starting a new conversation when
    /// none is given.
    #[instrument(skip(self, message))]
    pub async fn send_message(
        &self,
        session: Option<ConversationId>,
        message: &str,
    ) -> Result<ChatReply, RelayError> {
        let new_message = CustomerMessage::parse(message)
            .map_err(|err| RelayError::InvalidMessage(err.to_string()))?;

        let session_id = match session {
            Some(id) => {
                if !self.store.conversation_exists(id).await? {
                    return Err(RelayError::ConversationNotFound(id));
                }
                id
            }
            None => {
                let id = self.store.create_conversation().await?;
                info!(session = %id, "Started new conversation");
                id
            }
        };

        // Read the window before appending so the new message is not also context.
        let recent = self
            .store
            .list_recent_messages(session_id, DEFAULT_CONTEXT_LIMIT)
            .await?;
        self.store
            .append_message(session_id, SENDER_USER, new_message.as_str())
            .await?;
        debug!(session = %session_id, context_messages = recent.len(), "Stored user message");

        let reply = self
            .orchestrator
            .generate(&recent, &new_message)
            .await
            .into_result()
            .map_err(|err| {
                warn!(
                    session = %session_id,
                    kind = %err.kind,
                    attempts = err.attempts,
                    "Generation failed"
                );
                RelayError::from(err)
            })?;

        self.store
            .append_message(session_id, SENDER_AI, &reply)
            .await?;

        Ok(ChatReply {
            reply,
            session_id,
        })
    }

    pub async fn history(
        &self,
        session: ConversationId,
    ) -> Result<ConversationHistory, RelayError> {
        let messages = self
            .store
            .conversation_history(session)
            .await?
            .ok_or(RelayError::ConversationNotFound(session))?;
        Ok(ConversationHistory {
            session_id: session,
            messages: messages.into_iter().map(HistoryMessage::from).collect(),
        })
    }

    pub async fn health(&self) -> HealthReport {
        let (status, database) = match self.store.ping().await {
            Ok(()) => ("healthy", "connected"),
            Err(err) => {
                warn!(error = %err, "Storage health check failed");
                ("unhealthy", "disconnected")
            }
        };
        let client = self.orchestrator.client();
        HealthReport {
            status: status.to_string(),
            database: database.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            provider: client.provider_name().to_string(),
            model: client.model_name().to_string(),
        }
    }
}
