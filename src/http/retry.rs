//! Request policy and the exponential-backoff retry loop.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::error::{ApiError, Failure, classify};

/// Additional attempts after the first one.
pub const DEFAULT_RETRIES: u32 = 3;

/// Base backoff unit.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Effective settings for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
    pub retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Per-call configuration: policy overrides plus transport extras.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub timeout: Option<Duration>,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Merges the overrides onto `defaults`, producing a fresh policy for one call.
    ///
    /// A zero timeout is treated as "not set".
    pub fn policy(&self, defaults: &RequestPolicy) -> RequestPolicy {
        RequestPolicy {
            retries: self.retries.unwrap_or(defaults.retries),
            retry_delay: self.retry_delay.unwrap_or(defaults.retry_delay),
            timeout: self
                .timeout
                .filter(|t| !t.is_zero())
                .unwrap_or(defaults.timeout),
        }
    }
}

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. Sleeps with tokio between attempts.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    policy: &RequestPolicy,
    operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
{
    with_retry_using(operation_name, policy, operation, tokio::time::sleep).await
}

/// Same as [`with_retry`] with a caller-supplied sleep.
///
/// Attempts are strictly sequential: the next one starts only after the
/// previous failure has been classified and its backoff has elapsed.
pub async fn with_retry_using<F, Fut, T, S, SFut>(
    operation_name: &str,
    policy: &RequestPolicy,
    mut operation: F,
    mut sleep: S,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Failure>>,
    S: FnMut(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    let max_attempts = policy.retries.saturating_add(1);
    let mut attempt: u32 = 0;

    loop {
        let failure = match operation().await {
            Ok(result) => return Ok(result),
            Err(failure) => failure,
        };

        let error = classify(&failure);
        if !error.retryable() {
            debug!(
                "{}: non-retryable {} ({}): {}",
                operation_name,
                error.code(),
                failure,
                error
            );
            return Err(error);
        }

        if attempt >= policy.retries {
            warn!(
                "{}: giving up after {} attempt(s): {} ({})",
                operation_name,
                attempt + 1,
                error.code(),
                failure
            );
            return Err(error);
        }

        let delay = backoff_delay(policy.retry_delay, attempt);
        warn!(
            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
            operation_name,
            attempt + 1,
            max_attempts,
            failure,
            delay.as_millis()
        );
        sleep(delay).await;
        attempt += 1;
    }
}
