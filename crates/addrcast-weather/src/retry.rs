//! Retry policy for outbound upstream requests.
//!
//! Off by default: with `max_retries == 0` every request gets exactly one
//! attempt and the first failure fails the forecast. When enabled, only
//! transient failures are retried:
//! - Timeouts and connection errors
//! - 5xx, 408 and 429 responses
//!
//! Other 4xx responses and body errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use addrcast_core::RetrySettings;
use reqwest::{Response, StatusCode};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry (doubles each attempt)
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_retries,
            settings.initial_delay_ms,
            settings.max_delay_ms,
        )
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Delay before retry number `attempt` (zero-based), capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

pub fn is_retryable_error(error: &reqwest::Error) -> RetryDecision {
    if error.is_timeout() || error.is_connect() {
        return RetryDecision::Retry;
    }

    match error.status() {
        Some(status) if !error.is_request() => is_retryable_status(status),
        _ => RetryDecision::NoRetry,
    }
}

pub fn is_retryable_status(status: StatusCode) -> RetryDecision {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        RetryDecision::Retry
    } else {
        RetryDecision::NoRetry
    }
}

/// Run `operation` until it succeeds, fails permanently, or the retry budget
/// is spent. The last response or error is returned as-is.
pub async fn with_retry<F, Fut>(config: &RetryConfig, operation: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;

    loop {
        let result = operation().await;

        let decision = match &result {
            Ok(response) => is_retryable_status(response.status()),
            Err(e) => is_retryable_error(e),
        };

        if decision == RetryDecision::NoRetry || attempt >= config.max_retries {
            if attempt > 0 && result.is_ok() {
                tracing::info!("Upstream request finished after {} retries", attempt);
            }
            return result;
        }

        let delay = config.delay_for_attempt(attempt);
        attempt += 1;
        match &result {
            Ok(response) => tracing::warn!(
                "Upstream returned {}, retry {} of {} in {:?}",
                response.status(),
                attempt,
                config.max_retries,
                delay
            ),
            Err(e) => tracing::warn!(
                "Upstream request failed ({}), retry {} of {} in {:?}",
                e,
                attempt,
                config.max_retries,
                delay
            ),
        }
        tokio::time::sleep(delay).await;
    }
}
