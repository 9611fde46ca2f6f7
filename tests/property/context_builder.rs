//! Property-based tests for the context builder and error classifier

use proptest::prelude::*;
use support_relay::context::{self, ConversationTurn, Role, DEFAULT_CONTEXT_LIMIT};
use support_relay::conversation::{ConversationId, StoredMessage};
use support_relay::error::ErrorKind;
use support_relay::generation::classify;

fn stored(index: usize, sender: &str, text: &str) -> StoredMessage {
    StoredMessage {
        id: index as u64 + 1,
        conversation_id: ConversationId::new(1),
        sender: sender.to_string(),
        text: text.to_string(),
        created_at: chrono::Utc::now(),
    }
}

fn sender() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("user".to_string()),
        Just("ai".to_string()),
        "[a-z]{1,8}",
    ]
}

fn non_blank_text() -> impl Strategy<Value = String> {
    "[ ]{0,2}[a-zA-Z0-9?!.]{1,40}[ ]{0,2}"
}

fn any_text() -> impl Strategy<Value = String> {
    prop_oneof![
        non_blank_text(),
        Just(String::new()),
        "[ \t\n]{1,5}",
    ]
}

fn history(
    text: impl Strategy<Value = String>,
    max_len: usize,
) -> impl Strategy<Value = Vec<StoredMessage>> {
    prop::collection::vec((sender(), text), 0..=max_len).prop_map(|entries| {
        entries
            .iter()
            .enumerate()
            .map(|(i, (sender, text))| stored(i, sender, text))
            .collect()
    })
}

fn back_to_history(turns: &[ConversationTurn]) -> Vec<StoredMessage> {
    turns
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            let sender = match turn.role {
                Role::User => "user",
                Role::Assistant => "ai",
            };
            stored(i, sender, turn.content.as_str())
        })
        .collect()
}

proptest! {
    #[test]
    fn non_blank_history_keeps_length_and_roles(
        history in history(non_blank_text(), DEFAULT_CONTEXT_LIMIT)
    ) {
        let turns = context::build(&history, DEFAULT_CONTEXT_LIMIT);
        prop_assert_eq!(turns.len(), history.len());
        for (turn, message) in turns.iter().zip(&history) {
            let expected = if message.sender == "user" { Role::User } else { Role::Assistant };
            prop_assert_eq!(turn.role, expected);
            prop_assert_eq!(turn.content.as_str(), message.text.as_str());
        }
    }

    #[test]
    fn blank_entries_are_dropped_and_build_is_idempotent(
        history in history(any_text(), DEFAULT_CONTEXT_LIMIT)
    ) {
        let turns = context::build(&history, DEFAULT_CONTEXT_LIMIT);
        prop_assert!(turns.iter().all(|turn| !turn.content.trim().is_empty()));

        let non_blank = history.iter().filter(|m| !m.text.trim().is_empty()).count();
        prop_assert_eq!(turns.len(), non_blank);

        let rebuilt = context::build(&back_to_history(&turns), DEFAULT_CONTEXT_LIMIT);
        prop_assert_eq!(rebuilt, turns);
    }

    #[test]
    fn long_history_keeps_only_newest_window(
        history in history(non_blank_text(), 3 * DEFAULT_CONTEXT_LIMIT)
    ) {
        let turns = context::build(&history, DEFAULT_CONTEXT_LIMIT);
        prop_assert!(turns.len() <= DEFAULT_CONTEXT_LIMIT);
        if let Some(last) = history.last() {
            prop_assert_eq!(turns.last().map(|t| t.content.as_str()), Some(last.text.as_str()));
        }
    }
}

/// Any message mentioning 429 is rate limited, whatever surrounds it.
#[test]
fn test_rate_limit_marker_always_wins() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&("[a-z ]{0,30}", "[a-z ]{0,30}"), |(prefix, suffix)| {
            let message = format!("{prefix}429{suffix}");
            assert_eq!(classify(&message), ErrorKind::RateLimited);
            Ok(())
        })
        .unwrap();
}

/// Classification ignores case.
#[test]
fn test_classification_is_case_insensitive() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[a-zA-Z0-9 ]{0,40}", |message| {
            assert_eq!(classify(&message), classify(&message.to_uppercase()));
            assert_eq!(classify(&message), classify(&message.to_lowercase()));
            Ok(())
        })
        .unwrap();
}
