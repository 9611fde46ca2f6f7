//! Deadline race for provider calls.
//!
//! The operation and the deadline timer run concurrently; whichever settles
//! first decides the result. On expiry the operation future is dropped, so a
//! late provider response can never reach the caller or trigger side effects.

use crate::provider::ProviderError;
use std::future::Future;
use std::time::Duration;

/// Hard upper bound on a single provider attempt.
pub const REQUEST_DEADLINE: Duration = Duration::from_millis(30_000);

/// Race `operation` against `deadline`.
pub async fn with_timeout<F, T>(operation: F, deadline: Duration) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::DeadlineExceeded(deadline)),
    }
}
