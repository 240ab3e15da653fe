//! Classified fixed-backoff retry for report fetches.
//!
//! Every failure is retried. The wait before the next attempt depends on the
//! error text: server-side internal errors clear quickly, anything else
//! (quota exhaustion, network trouble, malformed responses) is waited out for
//! much longer.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Substring identifying a transient server-side failure.
pub const SERVER_ERROR_MARKER: &str = "Internal Server Error";

const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_SERVER_ERROR_BACKOFF: Duration = Duration::from_secs(5);
const DEFAULT_OTHER_BACKOFF: Duration = Duration::from_hours(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per entry, including the first.
    pub max_attempts: u32,
    pub server_error_backoff: Duration,
    pub other_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            server_error_backoff: DEFAULT_SERVER_ERROR_BACKOFF,
            other_backoff: DEFAULT_OTHER_BACKOFF,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, server_error_backoff_secs: u64, other_backoff_secs: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            server_error_backoff: Duration::from_secs(server_error_backoff_secs),
            other_backoff: Duration::from_secs(other_backoff_secs),
        }
    }

    /// Backoff to wait after a failure whose display text is `message`.
    #[must_use]
    pub fn backoff_for(&self, message: &str) -> Duration {
        if is_server_error(message) {
            self.server_error_backoff
        } else {
            self.other_backoff
        }
    }
}

#[must_use]
pub fn is_server_error(message: &str) -> bool {
    message.contains(SERVER_ERROR_MARKER)
}

/// Blocking wait between attempts. Injected so tests can record backoffs
/// instead of sleeping.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(duration)
    }
}

/// Runs `operation` until it succeeds or `policy.max_attempts` attempts have
/// failed, sleeping the classified backoff between attempts.
///
/// No sleep follows the final failed attempt; its error is returned.
///
/// # Errors
///
/// Returns the error of the final attempt once every attempt has failed.
///
/// # Backoff schedule (defaults)
///
/// | Failure text contains          | Sleep before next attempt |
/// |--------------------------------|---------------------------|
/// | `Internal Server Error`        | 5 s                       |
/// | anything else                  | 3600 s                    |
pub async fn retry_classified<T, F, Fut, S>(
    policy: &RetryPolicy,
    sleeper: &S,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
    S: Sleeper,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    tracing::warn!(attempt, max_attempts, error = %err, "giving up after final attempt");
                    return Err(err);
                }
                let backoff = policy.backoff_for(&err.to_string());
                tracing::warn!(
                    attempt,
                    max_attempts,
                    backoff_secs = backoff.as_secs(),
                    error = %err,
                    "report fetch failed, retrying after backoff"
                );
                sleeper.sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
