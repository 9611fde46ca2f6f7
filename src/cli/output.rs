//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::RelayError;

/// Map service errors to the caller-facing line, prefixed with the status code.
pub fn map_error(e: &RelayError) -> String {
    format!("Error [{}]: {}", e.status_code(), caller_message(e))
}

/// Generation failures show only the kind's caller message.
fn caller_message(e: &RelayError) -> String {
    match e {
        RelayError::Generation(classified) => classified.kind.user_message().to_string(),
        other => other.to_string(),
    }
}
