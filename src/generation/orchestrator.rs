//! Response Orchestrator
//!
//! Drives the attempt loop for one customer message:
//!
//! ```text
//! Attempting(0) ──fail/transient──▶ sleep 1s ──▶ Attempting(1) ──▶ sleep 2s ──▶ Attempting(2)
//!       │                                              │                              │
//!       ├─ success ───────────────▶ Succeeded(text)    │                              │
//!       ├─ content filtered ──────▶ Succeeded(deflection)                             │
//!       └─ fail-fast kind ────────▶ Failed(kind) ◀─────┴──────── budget spent ────────┘
//! ```
//!
//! Attempts of one call are strictly sequential and all state is call-local, so
//! one orchestrator can serve any number of concurrent calls.

use crate::context::{self, DEFAULT_CONTEXT_LIMIT};
use crate::conversation::StoredMessage;
use crate::error::ErrorKind;
use crate::generation::classifier::{classify, is_soft_refusal, DEFLECTION_TEXT};
use crate::generation::request::{CustomerMessage, GenerationOutcome, GenerationRequest};
use crate::generation::retry::{AttemptState, FailureDecision, RetryPolicy};
use crate::generation::timeout::{with_timeout, REQUEST_DEADLINE};
use crate::provider::{GenerationClientRef, GenerationOptions, ProviderError};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Composes context building, the provider call, the deadline race and the
/// retry classifier into a single `generate` call.
pub struct ResponseOrchestrator {
    client: GenerationClientRef,
    options: GenerationOptions,
    policy: RetryPolicy,
}

impl ResponseOrchestrator {
    pub fn new(client: GenerationClientRef) -> Self {
        Self {
            client,
            options: GenerationOptions::default(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn client(&self) -> &GenerationClientRef {
        &self.client
    }

    /// Generate a reply to `new_message` given the stored `history` window.
    pub async fn generate(
        &self,
        history: &[StoredMessage],
        new_message: &CustomerMessage,
    ) -> GenerationOutcome {
        let context = context::build(history, DEFAULT_CONTEXT_LIMIT);
        let request = GenerationRequest::from_parts(context, new_message.clone());
        self.generate_request(&request).await
    }

    /// Run the attempt loop for an already built request.
    pub async fn generate_request(&self, request: &GenerationRequest) -> GenerationOutcome {
        let max_attempts = self.policy.max_attempts();

        for attempt_index in 0..max_attempts {
            let attempt = AttemptState::begin(attempt_index);
            debug!(
                attempt = attempt.number(),
                max_attempts,
                provider = self.client.provider_name(),
                model = self.client.model_name(),
                context_turns = request.context().len(),
                "Starting generation attempt"
            );

            let result = with_timeout(
                self.client
                    .invoke(request.context(), request.new_message(), &self.options),
                REQUEST_DEADLINE,
            )
            .await;

            let failure = match result {
                Ok(text) => {
                    let reply = text.trim();
                    if reply.is_empty() {
                        ProviderError::EmptyResponse
                    } else if is_soft_refusal(reply) && self.policy.has_retry_after(attempt_index) {
                        warn!(
                            attempt = attempt.number(),
                            max_attempts, "AI refused to answer, trying again"
                        );
                        continue;
                    } else {
                        info!(
                            attempt = attempt.number(),
                            elapsed_ms = attempt.elapsed_ms() as u64,
                            reply_len = reply.len(),
                            "Generation succeeded"
                        );
                        return GenerationOutcome::Success {
                            text: reply.to_string(),
                        };
                    }
                }
                Err(err) => err,
            };

            let kind = classify(&failure.to_string());
            error!(
                attempt = attempt.number(),
                max_attempts,
                kind = %kind,
                elapsed_ms = attempt.elapsed_ms() as u64,
                error = %failure,
                "AI generation error"
            );

            match self.policy.decide(kind, attempt_index) {
                FailureDecision::Deflect => {
                    info!(attempt = attempt.number(), "Provider filtered content, deflecting");
                    return GenerationOutcome::Success {
                        text: DEFLECTION_TEXT.to_string(),
                    };
                }
                FailureDecision::Terminal(kind) => {
                    return GenerationOutcome::Failure {
                        kind,
                        attempt: attempt.number(),
                    };
                }
                FailureDecision::Retry { kind, delay } => {
                    info!(
                        attempt = attempt.number(),
                        kind = %kind,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying generation after backoff"
                    );
                    sleep(delay).await;
                }
            }
        }

        // Every branch above returns on the last attempt; kept as a floor.
        GenerationOutcome::Failure {
            kind: ErrorKind::Unknown,
            attempt: max_attempts,
        }
    }
}
