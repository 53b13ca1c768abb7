//! Rate-limited, retrying HTTP client for the OpenF1 API.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::schema::{ApiDriver, ApiSession, ApiSessionResult};
use crate::config::OpenF1Config;
use crate::retry::{retry_if, RetryConfig};

/// OpenF1 API client
pub struct OpenF1Client {
    http: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
    retry: RetryConfig,
}

impl OpenF1Client {
    pub fn new(config: &OpenF1Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            limiter: RateLimiter::from_config(config),
            retry: RetryConfig::network(),
        })
    }

    /// Sessions of one year, all types
    pub async fn sessions(&self, year: i32) -> Result<Vec<ApiSession>> {
        self.fetch_json(&super::sessions_url(&self.base_url, year)).await
    }

    pub async fn session_results(&self, session_key: i64) -> Result<Vec<ApiSessionResult>> {
        self.fetch_json(&super::session_result_url(&self.base_url, session_key))
            .await
    }

    pub async fn drivers(&self, session_key: i64) -> Result<Vec<ApiDriver>> {
        self.fetch_json(&super::drivers_url(&self.base_url, session_key))
            .await
    }

    /// GET a URL and decode its JSON body.
    ///
    /// Every attempt waits on the rate limiter. Throttling, server errors and
    /// transport failures are retried; other client errors fail immediately.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let http = &self.http;
        let limiter = &self.limiter;

        let body = retry_if(
            &self.retry,
            url,
            move || async move {
                limiter.acquire().await;
                debug!(url, "GET");
                http.get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<T>()
                    .await
            },
            is_transient,
        )
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

        Ok(body)
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    match err.status() {
        Some(status) => status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        None => !err.is_decode(),
    }
}
