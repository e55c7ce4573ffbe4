//! Shared HTTP plumbing for the upstream adapters.

use std::sync::Arc;
use std::time::Duration;

use addrcast_core::{ForecastError, NetworkError, UpstreamConfig};
use reqwest::{header, Client};

use crate::retry::{with_retry, RetryConfig};

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// GET-only client returning response bodies as text.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Arc<Client>,
    retry: RetryConfig,
}

impl UpstreamClient {
    pub fn new(timeout: Duration, user_agent: &str, retry: RetryConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            retry,
        })
    }

    pub fn from_config(config: &UpstreamConfig, retry: RetryConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            Duration::from_secs(config.request_timeout_secs),
            &config.user_agent,
            retry,
        )
    }

    /// Fetch `url` and return the body verbatim. Any non-2xx status is an
    /// upstream error; the body is never inspected here.
    pub async fn get_text(&self, service: &'static str, url: &str) -> Result<String, ForecastError> {
        tracing::debug!("Requesting {} at {}", service, url);

        let response = with_retry(&self.retry, || {
            self.client
                .get(url)
                .header(header::ACCEPT, "application/geo+json, application/json")
                .send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            return Err(NetworkError::ServerError {
                status: status.as_u16(),
                message: format!("{} returned {}: {}", service, status, preview),
            }
            .into());
        }

        Ok(response.text().await?)
    }
}
