//! Bitly HTTP client with exponential backoff retry logic.
//!
//! - [`BitlyApi`]: core trait, "GET this URL and decode the JSON body"
//! - [`HttpBitly`]: reqwest implementation sending the bearer token
//! - [`RetryApi`]: decorator adding retries to any `BitlyApi`
//!
//! # Retry Strategy
//!
//! Only transient failures are retried (transport errors, HTTP 429 and
//! 5xx). Other statuses and undecodable bodies fail at once.
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second, capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay

use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Failure talking to the Bitly API.
#[derive(Debug, Error)]
pub enum BitlyError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Missing(String),
}

impl BitlyError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            BitlyError::Transport { .. } => true,
            BitlyError::Status { status, .. } => *status == 429 || *status >= 500,
            BitlyError::Decode { .. } | BitlyError::Missing(_) => false,
        }
    }
}

/// Access to the Bitly v4 REST API.
pub trait BitlyApi {
    /// GET `url` and decode the JSON response body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BitlyError>;
}

/// Bitly client authenticating with a personal access token.
pub struct HttpBitly {
    client: Client,
    token: String,
}

impl HttpBitly {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }
}

impl fmt::Debug for HttpBitly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBitly")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl BitlyApi for HttpBitly {
    #[instrument(level = "debug", skip(self))]
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BitlyError> {
        let transport = |source| BitlyError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(BitlyError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate_for_log(&body, 300),
            });
        }
        debug!(status = status.as_u16(), bytes = body.len(), "Bitly response");
        serde_json::from_str(&body).map_err(|source| BitlyError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Wrapper that adds exponential backoff retries to any [`BitlyApi`].
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryApi<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryApi<T>
where
    T: BitlyApi,
{
    /// Wrap `inner`, retrying transient failures up to `max_retries` times.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn delay_for(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryApi<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryApi")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> BitlyApi for RetryApi<T>
where
    T: BitlyApi,
{
    #[instrument(level = "debug", skip(self))]
    async fn get_json<R: DeserializeOwned>(&self, url: &str) -> Result<R, BitlyError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.get_json(url).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => {
                    error!(error = %e, "Bitly request failed permanently");
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "Bitly request exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                        ?delay,
                        error = %e,
                        "Bitly request failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
