//! Retry budget and backoff.

use crate::error::ErrorKind;
use std::time::Duration;
use tokio::time::Instant;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDecision {
    /// Sleep for `delay`, then try again
    Retry { kind: ErrorKind, delay: Duration },
    /// Give up with this kind
    Terminal(ErrorKind),
    /// Answer with the fixed deflection text instead of failing
    Deflect,
}

/// Bounded retry with linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay unit; attempt `i` waits `base_delay * (i + 1)`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Whether another attempt may follow `attempt_index`
    pub fn has_retry_after(&self, attempt_index: u32) -> bool {
        attempt_index < self.max_retries
    }

    pub fn backoff(&self, attempt_index: u32) -> Duration {
        self.base_delay * (attempt_index + 1)
    }

    /// Decide the transition for a failure of `kind` on `attempt_index`.
    pub fn decide(&self, kind: ErrorKind, attempt_index: u32) -> FailureDecision {
        match kind {
            ErrorKind::RateLimited | ErrorKind::AuthConfig | ErrorKind::Network => {
                FailureDecision::Terminal(kind)
            }
            ErrorKind::ContentFiltered => FailureDecision::Deflect,
            ErrorKind::Timeout | ErrorKind::Unknown => {
                if self.has_retry_after(attempt_index) {
                    FailureDecision::Retry {
                        kind,
                        delay: self.backoff(attempt_index),
                    }
                } else {
                    FailureDecision::Terminal(kind)
                }
            }
        }
    }
}

/// Per-attempt bookkeeping, local to one orchestration call.
#[derive(Debug, Clone, Copy)]
pub struct AttemptState {
    pub attempt_index: u32,
    pub started_at: Instant,
}

impl AttemptState {
    pub fn begin(attempt_index: u32) -> Self {
        Self {
            attempt_index,
            started_at: Instant::now(),
        }
    }

    /// 1-based attempt number for logs
    pub fn number(&self) -> u32 {
        self.attempt_index + 1
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}
