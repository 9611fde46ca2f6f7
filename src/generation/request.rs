use crate::context::{ConversationTurn, NonEmptyText, DEFAULT_CONTEXT_LIMIT};
use crate::error::{ClassifiedError, ErrorKind};
use thiserror::Error;

/// Upper bound on the customer message, counted in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Input rejected before any provider call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Message is required")]
    EmptyMessage,

    #[error("Message is too long. Please keep it under {max} characters.")]
    MessageTooLong { len: usize, max: usize },
}

/// A customer message that passed validation: trimmed, non-empty and at most
/// [`MAX_MESSAGE_CHARS`] characters. Only [`CustomerMessage::parse`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerMessage(NonEmptyText);

impl CustomerMessage {
    pub fn parse(raw_message: &str) -> Result<Self, RequestError> {
        let trimmed = raw_message.trim();
        let len = trimmed.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(RequestError::MessageTooLong {
                len,
                max: MAX_MESSAGE_CHARS,
            });
        }
        NonEmptyText::new(trimmed)
            .map(Self)
            .ok_or(RequestError::EmptyMessage)
    }

    pub fn as_text(&self) -> &NonEmptyText {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Context plus the new customer message, shared immutably by all attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    context: Vec<ConversationTurn>,
    new_message: CustomerMessage,
}

impl GenerationRequest {
    /// Validate the raw message (trimmed, non-empty, at most
    /// [`MAX_MESSAGE_CHARS`]) and keep the newest turns of `context`.
    pub fn new(context: Vec<ConversationTurn>, raw_message: &str) -> Result<Self, RequestError> {
        let new_message = CustomerMessage::parse(raw_message)?;
        Ok(Self::from_parts(context, new_message))
    }

    pub(crate) fn from_parts(
        mut context: Vec<ConversationTurn>,
        new_message: CustomerMessage,
    ) -> Self {
        if context.len() > DEFAULT_CONTEXT_LIMIT {
            context.drain(..context.len() - DEFAULT_CONTEXT_LIMIT);
        }
        Self {
            context,
            new_message,
        }
    }

    pub fn context(&self) -> &[ConversationTurn] {
        &self.context
    }

    pub fn new_message(&self) -> &NonEmptyText {
        self.new_message.as_text()
    }
}

/// Result of one orchestration call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success { text: String },
    /// `attempt` is the number of provider attempts made.
    Failure { kind: ErrorKind, attempt: u32 },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }

    pub fn into_result(self) -> Result<String, ClassifiedError> {
        match self {
            GenerationOutcome::Success { text } => Ok(text),
            GenerationOutcome::Failure { kind, attempt } => {
                Err(ClassifiedError::new(kind, attempt))
            }
        }
    }
}
