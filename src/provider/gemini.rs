//! Gemini `generateContent` client.

use crate::context::{ConversationTurn, NonEmptyText, Role};
use crate::error::RelayError;
use crate::provider::{GenerationClient, GenerationOptions, ProviderConfig, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Finish reasons for which the provider withholds the candidate text.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: WireGenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

fn role_to_string(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn text_content(role: &str, text: String) -> Content {
    Content {
        role: Some(role.to_string()),
        parts: vec![Part { text: Some(text) }],
    }
}

fn build_request(
    system_prompt: &str,
    context: &[ConversationTurn],
    new_message: &NonEmptyText,
    options: &GenerationOptions,
) -> GenerateContentRequest {
    let mut contents: Vec<Content> = context
        .iter()
        .map(|turn| text_content(role_to_string(turn.role), turn.content.to_string()))
        .collect();
    contents.push(text_content(
        "user",
        format!("{}\n\nUser question: {}", system_prompt, new_message),
    ));

    GenerateContentRequest {
        contents,
        generation_config: WireGenerationConfig {
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k,
            max_output_tokens: options.max_output_tokens,
        },
    }
}

/// Concatenated text of the first candidate. A missing candidate yields empty
/// text, which the orchestrator treats as a transient fault.
fn extract_text(response: &GenerateContentResponse) -> Result<String, ProviderError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return Err(ProviderError::Blocked(reason.to_string()));
    }

    let Some(candidate) = response.candidates.first() else {
        return Ok(String::new());
    };

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(ProviderError::Blocked(reason.to_string()));
        }
    }

    Ok(candidate
        .content
        .as_ref()
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default())
}

fn map_transport_error(error: reqwest::Error) -> ProviderError {
    let error = error.without_url();
    if error.is_timeout() {
        ProviderError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ProviderError::Transport(format!("Network error: connection failed: {}", error))
    } else {
        ProviderError::Transport(format!("HTTP error: {}", error))
    }
}

/// Gemini provider client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    system_prompt: String,
}

impl GeminiClient {
    /// Build a client from configuration. A missing API key is a startup-time
    /// configuration error.
    pub fn new(config: &ProviderConfig) -> Result<Self, RelayError> {
        config.validate().map_err(RelayError::ConfigError)?;
        let api_key = config.api_key.clone().ok_or_else(|| {
            RelayError::ConfigError(
                "GEMINI_API_KEY environment variable is not set and provider.api_key is empty"
                    .to_string(),
            )
        })?;

        let client = Client::builder()
            .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
            .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RelayError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            system_prompt: config.system_prompt().to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn invoke(
        &self,
        context: &[ConversationTurn],
        new_message: &NonEmptyText,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let request = build_request(&self.system_prompt, context, new_message, options);
        debug!(
            model = %self.model,
            context_turns = context.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Error").to_string(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse body: {}", e)))?;

        extract_text(&parsed)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
