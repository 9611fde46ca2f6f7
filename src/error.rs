//! Error types for the support relay.

use crate::conversation::ConversationId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to encode or decode record: {0}")]
    Codec(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Codec(err.to_string())
    }
}

/// Closed taxonomy of generation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    RateLimited,
    AuthConfig,
    Timeout,
    Network,
    ContentFiltered,
    Unknown,
}

impl ErrorKind {
    /// Status code the request-handling layer answers with for this kind.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::RateLimited => 503,
            ErrorKind::Timeout => 504,
            ErrorKind::AuthConfig
            | ErrorKind::Network
            | ErrorKind::ContentFiltered
            | ErrorKind::Unknown => 500,
        }
    }

    /// Stable tag for logs and machine-readable output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "RATE_LIMIT",
            ErrorKind::AuthConfig => "API_KEY_ERROR",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::ContentFiltered => "CONTENT_FILTERED",
            ErrorKind::Unknown => "AI_ERROR",
        }
    }

    /// Caller-facing message. Never contains provider text.
    pub fn user_message(self) -> &'static str {
        match self {
            ErrorKind::RateLimited => {
                "Our support agent is experiencing high demand. Please try again in a moment."
            }
            ErrorKind::Timeout => "Request timed out. Please try again.",
            ErrorKind::AuthConfig => "Support agent configuration error. Please contact support.",
            ErrorKind::Network
            | ErrorKind::ContentFiltered
            | ErrorKind::Unknown => {
                "Our support agent is temporarily unavailable. Please try again in a moment."
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider failure resolved to one [`ErrorKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {} (after {attempts} attempt(s))", kind.user_message())]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Number of provider attempts made before giving up.
    pub attempts: u32,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, attempts: u32) -> Self {
        Self { kind, attempts }
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }
}

/// Service-level errors surfaced to the request-handling layer.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    InvalidMessage(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error(transparent)]
    Generation(#[from] ClassifiedError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Input error: {0}")]
    Input(String),

    /// Health check ran but a dependency is down; carries the rendered report.
    #[error("{0}")]
    Unhealthy(String),
}

impl RelayError {
    /// Status code semantics for the caller.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::InvalidMessage(_) => 400,
            RelayError::ConversationNotFound(_) => 404,
            RelayError::Generation(err) => err.http_status(),
            RelayError::StorageError(StorageError::ConversationNotFound(_)) => 404,
            RelayError::Unhealthy(_) => 503,
            RelayError::StorageError(_)
            | RelayError::ConfigError(_)
            | RelayError::Output(_)
            | RelayError::Input(_) => 500,
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Output(err.to_string())
    }
}

impl From<dialoguer::Error> for RelayError {
    fn from(err: dialoguer::Error) -> Self {
        RelayError::Input(err.to_string())
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(err: config::ConfigError) -> Self {
        RelayError::ConfigError(err.to_string())
    }
}
