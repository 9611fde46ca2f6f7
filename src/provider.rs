//! Generation Provider Abstraction
//!
//! Uniform contract over the hosted language-generation service. A client
//! performs exactly one outbound call per `invoke`, never retries on its own and
//! reports failures as raw provider text; classification happens upstream in
//! [`crate::generation`].

use crate::context::{ConversationTurn, NonEmptyText};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod gemini;

pub use gemini::GeminiClient;

/// Persona and store policy prepended to every customer question.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful customer support agent about a small e-commerce store.

Store info:
- Shipping: 3–5 business days, ships to India and USA
- Returns: 7-day return on unused items
- Support hours: Mon–Fri, 10am–6pm IST

Rules:
1. Be helpful, friendly, and professional
2. Answer questions clearly and concisely
3. Use proper formatting with headings and bullet points for clarity
4. If information is not in the knowledge base, politely inform the customer and offer to help with related questions
5. Always prioritize customer satisfaction
6. For issues outside your knowledge, guide customers to contact support directly";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Sampling policy sent with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 500,
        }
    }
}

/// Raw provider failure. The rendered message is what the classifier inspects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("[{status} {reason}] {body}")]
    Http {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("{0}")]
    Transport(String),

    #[error("Response was blocked due to {0}")]
    Blocked(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// The deadline is kept for diagnostics only; digits in the rendered
    /// message would feed the substring classifier.
    #[error("AI request timeout")]
    DeadlineExceeded(Duration),

    #[error("Empty response from AI")]
    EmptyResponse,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; falls back to `GEMINI_API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Overrides the built-in store persona
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            system_prompt: None,
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(format!("Invalid endpoint URL: {}", self.endpoint));
        }
        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err("API key cannot be blank".to_string());
            }
        }
        Ok(())
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

/// Generation client trait
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Issue one generation request with `context` as prior turns.
    async fn invoke(
        &self,
        context: &[ConversationTurn],
        new_message: &NonEmptyText,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Shared handle to a client implementation
pub type GenerationClientRef = Arc<dyn GenerationClient>;
