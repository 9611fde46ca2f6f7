//! Integration tests for the response orchestrator's retry, deadline and
//! classification behavior. All timing runs on paused tokio time.

use crate::integration::test_utils::{fail, reply, ScriptedClient, Step};
use std::sync::Arc;
use std::time::Duration;
use support_relay::conversation::{ConversationId, StoredMessage, SENDER_AI, SENDER_USER};
use support_relay::error::ErrorKind;
use support_relay::generation::{
    CustomerMessage, GenerationOutcome, ResponseOrchestrator, DEFLECTION_TEXT,
};
use support_relay::provider::ProviderError;

fn message(text: &str) -> CustomerMessage {
    CustomerMessage::parse(text).unwrap()
}

fn stored(id: u64, sender: &str, text: &str) -> StoredMessage {
    StoredMessage {
        id,
        conversation_id: ConversationId::new(1),
        sender: sender.to_string(),
        text: text.to_string(),
        created_at: chrono::Utc::now(),
    }
}

async fn run(client: &Arc<ScriptedClient>) -> GenerationOutcome {
    ResponseOrchestrator::new(client.clone())
        .generate(&[], &message("Where is my order?"))
        .await
}

#[tokio::test(start_paused = true)]
async fn rate_limit_fails_fast_without_backoff() {
    let client = ScriptedClient::new(vec![fail("[429 Too Many Requests] slow down")]);
    let started = tokio::time::Instant::now();

    let outcome = run(&client).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Failure {
            kind: ErrorKind::RateLimited,
            attempt: 1
        }
    );
    assert_eq!(client.call_count(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn transient_timeouts_back_off_linearly_then_succeed() {
    let client = ScriptedClient::new(vec![
        fail("connect ETIMEDOUT 142.250.0.1:443"),
        fail("connect ETIMEDOUT 142.250.0.1:443"),
        reply("Your order shipped yesterday."),
    ]);

    let outcome = run(&client).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Success {
            text: "Your order shipped yesterday.".to_string()
        }
    );
    assert_eq!(client.call_count(), 3);
    assert_eq!(
        client.gaps(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
}

#[tokio::test(start_paused = true)]
async fn persistent_timeouts_exhaust_the_budget() {
    let client = ScriptedClient::with_fallback(Vec::new(), fail("ETIMEDOUT"));

    let outcome = run(&client).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Failure {
            kind: ErrorKind::Timeout,
            attempt: 3
        }
    );
    assert_eq!(client.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_provider_hits_the_deadline_on_every_attempt() {
    let late = Step::Slow(Duration::from_secs(45), "finally!".to_string());
    let client = ScriptedClient::with_fallback(Vec::new(), late);
    let started = tokio::time::Instant::now();

    let outcome = run(&client).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Failure {
            kind: ErrorKind::Timeout,
            attempt: 3
        }
    );
    // 3 deadlines plus the 1s and 2s backoffs.
    assert_eq!(started.elapsed(), Duration::from_secs(93));
}

#[tokio::test(start_paused = true)]
async fn slow_attempt_then_fast_success() {
    let client = ScriptedClient::new(vec![
        Step::Slow(Duration::from_secs(31), "too late".to_string()),
        reply("Right on time."),
    ]);

    let outcome = run(&client).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Success {
            text: "Right on time.".to_string()
        }
    );
    assert_eq!(client.gaps(), vec![Duration::from_secs(31)]);
}

#[tokio::test(start_paused = true)]
async fn refusal_on_final_attempt_is_returned_verbatim() {
    let refusal = "I cannot assist with that request.";
    let client = ScriptedClient::with_fallback(Vec::new(), reply(refusal));

    let outcome = run(&client).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Success {
            text: refusal.to_string()
        }
    );
    assert_eq!(client.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn safety_block_deflects_instead_of_failing() {
    let client = ScriptedClient::new(vec![Step::Fail(ProviderError::Blocked(
        "SAFETY".to_string(),
    ))]);

    let outcome = run(&client).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Success {
            text: DEFLECTION_TEXT.to_string()
        }
    );
    assert_eq!(client.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn deflection_after_a_transient_failure() {
    let client = ScriptedClient::new(vec![fail("upstream hiccup"), fail("Candidate blocked")]);

    let outcome = run(&client).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Success {
            text: DEFLECTION_TEXT.to_string()
        }
    );
    assert_eq!(client.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn network_and_auth_failures_are_terminal() {
    for (text, kind) in [
        ("getaddrinfo ENOTFOUND generativelanguage.googleapis.com", ErrorKind::Network),
        ("[403 Forbidden] permission denied", ErrorKind::AuthConfig),
    ] {
        let client = ScriptedClient::new(vec![fail(text)]);
        assert_eq!(
            run(&client).await,
            GenerationOutcome::Failure { kind, attempt: 1 }
        );
        assert_eq!(client.call_count(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn context_is_built_from_history() {
    let client = ScriptedClient::new(vec![reply("Sure.")]);
    let history = vec![
        stored(1, SENDER_USER, "Hi"),
        stored(2, SENDER_AI, "Hello! How can I help?"),
        stored(3, SENDER_USER, "   "),
    ];

    ResponseOrchestrator::new(client.clone())
        .generate(&history, &message("Can I return shoes?"))
        .await;

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].context.len(), 2);
    assert_eq!(calls[0].context[1].content.as_str(), "Hello! How can I help?");
    assert_eq!(calls[0].message, "Can I return shoes?");
}

#[tokio::test(start_paused = true)]
async fn every_attempt_sees_the_same_request() {
    let client = ScriptedClient::new(vec![fail("odd failure"), reply("ok")]);
    let history = vec![stored(1, SENDER_USER, "first")];

    ResponseOrchestrator::new(client.clone())
        .generate(&history, &message("second"))
        .await;

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].context, calls[1].context);
    assert_eq!(calls[0].message, calls[1].message);
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_keep_independent_state() {
    let orchestrator = Arc::new(ResponseOrchestrator::new(ScriptedClient::with_fallback(
        Vec::new(),
        reply("shared reply"),
    )));

    let calls = (0..8).map(|i| {
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator
                .generate(&[], &message(&format!("question {i}")))
                .await
        }
    });
    let outcomes = futures::future::join_all(calls).await;

    assert!(outcomes.iter().all(GenerationOutcome::is_success));
}
