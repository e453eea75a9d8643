//! HTTP client with rate limiting for hianime.to and its embed host
//!
//! This module provides the stock [`Host`] implementation: a paced reqwest
//! client that downloads pages, JSON endpoints and HLS manifests. Retries of
//! transient statuses are opt-in; by default every request is sent once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, warn};

use crate::error::{HiAnimeError, Result};
use crate::host::Host;
use crate::manifest::parse_manifest;
use crate::types::Format;

/// Browser User-Agent; the site serves captchas to unknown agents
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// First retry delay, doubled on every further attempt
const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Spaces requests at least `1 / requests_per_second` apart.
///
/// Shared by every request of one client, so callers holding the client in
/// an `Arc` are paced together.
pub struct RateLimiter {
    spacing: Duration,
    /// Earliest instant the next request may start; None before the first
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_second` requests.
    ///
    /// A rate with no finite positive spacing (zero, negative, NaN) gives a
    /// limiter that never waits.
    ///
    /// # Example
    /// ```
    /// use hianime_core::client::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(4.0);
    /// assert_eq!(limiter.spacing().as_millis(), 250);
    /// ```
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            spacing: Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or(Duration::ZERO),
            next_slot: Mutex::new(None),
        }
    }

    /// Wait for the next free slot and claim it.
    pub async fn acquire(&self) {
        let mut next_slot = self.next_slot.lock().await;
        if let Some(slot) = *next_slot {
            sleep_until(slot).await;
        }
        *next_slot = Some(Instant::now() + self.spacing);
    }

    /// Minimum time between two requests
    pub fn spacing(&self) -> Duration {
        self.spacing
    }
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum requests per second (default: 2.0)
    pub requests_per_second: f64,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Extra attempts for 429 and 5xx responses (default: 0)
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2.0,
            timeout_secs: 30,
            max_retries: 0,
        }
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Exponential backoff: 1s, 2s, 4s, ...
fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY.saturating_mul(1u32 << attempt.min(16))
}

/// Rate-limited HTTP client for hianime.to
///
/// Sends the `X-Requested-With` header the AJAX endpoints check, maps 404 to
/// [`HiAnimeError::NotFound`] and a final 429 to [`HiAnimeError::RateLimited`].
pub struct HiAnimeClient {
    client: reqwest::Client,
    rate_limiter: RateLimiter,
    max_retries: u32,
}

impl HiAnimeClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Errors
    /// * `HiAnimeError::InvalidConfig` if `requests_per_second` is not a
    ///   positive finite number
    /// * `HiAnimeError::HttpError` if the HTTP client cannot be created
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let rate = config.requests_per_second;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(HiAnimeError::InvalidConfig(format!(
                "requests_per_second must be positive, got {}",
                rate
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.requests_per_second),
            max_retries: config.max_retries,
        })
    }

    /// Send a GET and return the successful response.
    ///
    /// # Errors
    /// - `HiAnimeError::NotFound` - 404, never retried
    /// - `HiAnimeError::RateLimited` - 429 once the retry budget is spent
    /// - `HiAnimeError::HttpError` - transport failure or any other error status
    async fn get(&self, url: &str, note: &str) -> Result<Response> {
        debug!(url, "{}", note);

        let mut attempt = 0;
        loop {
            self.rate_limiter.acquire().await;
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::NOT_FOUND {
                return Err(HiAnimeError::NotFound(url.to_string()));
            }
            if is_transient(status) && attempt < self.max_retries {
                let delay = retry_delay(attempt);
                warn!(url, %status, attempt, ?delay, "transient error, retrying");
                sleep(delay).await;
                attempt += 1;
                continue;
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(HiAnimeError::RateLimited);
            }

            // Redirects reqwest did not follow pass through as-is
            return Ok(response.error_for_status()?);
        }
    }

    /// Fetch a URL as text
    ///
    /// # Errors
    /// See [`Host::fetch_text`]; status mapping as described on the type.
    pub async fn fetch(&self, url: &str, note: &str) -> Result<String> {
        Ok(self.get(url, note).await?.text().await?)
    }
}

#[async_trait]
impl Host for HiAnimeClient {
    async fn fetch_text(&self, url: &str, note: &str) -> Result<String> {
        self.fetch(url, note).await
    }

    async fn fetch_json(&self, url: &str, note: &str) -> Result<Value> {
        let body = self.fetch(url, note).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_manifest_formats(&self, manifest_url: &str, video_id: &str) -> Result<Vec<Format>> {
        let note = format!("{}: Downloading M3U8 information", video_id);
        let body = self.get(manifest_url, &note).await?.bytes().await?;
        parse_manifest(manifest_url, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_spacing() {
        assert_eq!(RateLimiter::new(2.0).spacing(), Duration::from_millis(500));
        assert_eq!(RateLimiter::new(1.0).spacing(), Duration::from_secs(1));
        assert_eq!(RateLimiter::new(4.0).spacing(), Duration::from_millis(250));
    }

    #[test]
    fn test_rate_limiter_out_of_range_rate_never_waits() {
        for rate in [0.0, -2.0, f64::NAN] {
            assert_eq!(RateLimiter::new(rate).spacing(), Duration::ZERO);
        }
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.requests_per_second, 2.0);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_client_with_custom_config() {
        let client = HiAnimeClient::with_config(ClientConfig {
            requests_per_second: 1.0,
            timeout_secs: 60,
            max_retries: 2,
        })
        .unwrap();
        assert_eq!(client.rate_limiter.spacing(), Duration::from_secs(1));
        assert_eq!(client.max_retries, 2);
    }

    #[test]
    fn test_client_rejects_non_positive_rate() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = HiAnimeClient::with_config(ClientConfig {
                requests_per_second: rate,
                ..ClientConfig::default()
            });
            match result {
                Err(HiAnimeError::InvalidConfig(message)) => {
                    assert!(message.contains("requests_per_second"))
                }
                Err(other) => panic!("Expected InvalidConfig for {rate}, got {other:?}"),
                Ok(_) => panic!("Expected InvalidConfig for {rate}"),
            }
        }
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient(StatusCode::NOT_FOUND));
        assert!(!is_transient(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_retry_delay_doubles() {
        assert_eq!(retry_delay(0), Duration::from_millis(1000));
        assert_eq!(retry_delay(1), Duration::from_millis(2000));
        assert_eq!(retry_delay(2), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(0.5);

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_second_acquire_waits_for_spacing() {
        let limiter = RateLimiter::new(10.0);

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
