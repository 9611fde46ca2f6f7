//! Error classification.
//!
//! Provider failures arrive as free text. They are resolved against an ordered
//! rule table: the first rule with a needle contained in the lowercased
//! message decides the [`ErrorKind`]; no match means [`ErrorKind::Unknown`].

use crate::error::ErrorKind;

/// Reply returned in place of provider content-filter failures.
pub const DEFLECTION_TEXT: &str =
    "I apologize, but I need to keep our conversation appropriate and helpful. Could you please rephrase your question?";

/// One `(predicate, kind)` entry of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub kind: ErrorKind,
    /// Lowercase substrings; any match selects `kind`.
    pub needles: &'static [&'static str],
}

impl ClassificationRule {
    fn matches(&self, lowercased: &str) -> bool {
        self.needles.iter().any(|needle| lowercased.contains(needle))
    }
}

/// Evaluated top to bottom. Order is precedence.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        kind: ErrorKind::RateLimited,
        needles: &["rate limit", "quota", "429"],
    },
    ClassificationRule {
        kind: ErrorKind::AuthConfig,
        needles: &["api key", "unauthorized", "401", "403"],
    },
    ClassificationRule {
        kind: ErrorKind::Timeout,
        needles: &["timeout", "etimedout", "econnaborted"],
    },
    ClassificationRule {
        kind: ErrorKind::Network,
        needles: &["network", "enotfound", "econnrefused"],
    },
    ClassificationRule {
        kind: ErrorKind::ContentFiltered,
        needles: &["safety", "blocked"],
    },
];

/// Classify a raw provider error message.
pub fn classify(message: &str) -> ErrorKind {
    let lowercased = message.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.matches(&lowercased))
        .map(|rule| rule.kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// Soft refusal heuristic: the reply says it cannot assist.
pub fn is_soft_refusal(text: &str) -> bool {
    let lowercased = text.to_lowercase();
    lowercased.contains("i cannot") && lowercased.contains("assist")
}
