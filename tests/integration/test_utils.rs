//! Shared test utilities for integration tests
//!
//! A scripted generation client that replays canned results and records when
//! each attempt started, so retry timing can be asserted under paused time.
//! Also a store whose connectivity check always fails.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use support_relay::context::{ConversationTurn, NonEmptyText};
use support_relay::conversation::{
    ConversationId, ConversationStore, InMemoryConversationStore, StoredMessage,
};
use support_relay::error::StorageError;
use support_relay::provider::{GenerationClient, GenerationOptions, ProviderError};
use tokio::time::Instant;

/// One scripted provider behavior.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Fail(ProviderError),
    /// Sleep before replying, to exercise the deadline.
    Slow(Duration, String),
}

pub fn reply(text: &str) -> Step {
    Step::Reply(text.to_string())
}

/// A failure whose message is `text`, as a transport error would carry it.
pub fn fail(text: &str) -> Step {
    Step::Fail(ProviderError::Transport(text.to_string()))
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub context: Vec<ConversationTurn>,
    pub message: String,
}

pub struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    /// Returned once the script runs out
    fallback: Step,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Self::with_fallback(steps, reply("Happy to help."))
    }

    pub fn with_fallback(steps: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Time between consecutive attempt starts.
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock();
        calls.windows(2).map(|pair| pair[1].at - pair[0].at).collect()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn invoke(
        &self,
        context: &[ConversationTurn],
        new_message: &NonEmptyText,
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        self.calls.lock().push(RecordedCall {
            at: Instant::now(),
            context: context.to_vec(),
            message: new_message.to_string(),
        });
        let step = self
            .steps
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Reply(text) => Ok(text),
            Step::Fail(err) => Err(err),
            Step::Slow(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// Delegates to an in-memory store but fails every `ping`.
#[derive(Default)]
pub struct DisconnectedStore {
    inner: InMemoryConversationStore,
}

#[async_trait]
impl ConversationStore for DisconnectedStore {
    async fn create_conversation(&self) -> Result<ConversationId, StorageError> {
        self.inner.create_conversation().await
    }

    async fn conversation_exists(&self, id: ConversationId) -> Result<bool, StorageError> {
        self.inner.conversation_exists(id).await
    }

    async fn append_message(
        &self,
        id: ConversationId,
        sender: &str,
        text: &str,
    ) -> Result<StoredMessage, StorageError> {
        self.inner.append_message(id, sender, text).await
    }

    async fn list_recent_messages(
        &self,
        id: ConversationId,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, StorageError> {
        self.inner.list_recent_messages(id, limit).await
    }

    async fn conversation_history(
        &self,
        id: ConversationId,
    ) -> Result<Option<Vec<StoredMessage>>, StorageError> {
        self.inner.conversation_history(id).await
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Err(StorageError::Backend("connection refused".to_string()))
    }
}
