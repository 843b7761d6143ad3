//! Retrying request executor
//!
//! Every remote call goes through [`Executor::execute`]: cache lookup, one or
//! more transport attempts with exponential backoff on transient failures,
//! response classification, and cache population on success.

use crate::cache::{CacheKey, CacheStore};
use crate::config::ClientConfig;
use crate::github::error::{ApiError, ApiResult};
use crate::github::rate_limit::{self, RateLimitStatus, RateLimitTracker, RateLimitVerdict};
use crate::github::transport::{RawResponse, Transport};
use chrono::Utc;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Progress of one logical request through the retry loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    /// Zero-based index of the attempt about to be made
    pub attempt: u32,
    /// Total time slept so far
    pub waited: Duration,
}

impl RetryState {
    /// Wait before the next attempt: `retry_delay * 2^attempt`
    pub fn next_delay(&self, retry_delay: Duration) -> Duration {
        retry_delay.saturating_mul(2u32.saturating_pow(self.attempt))
    }

    fn advance(&mut self, waited: Duration) {
        self.attempt += 1;
        self.waited += waited;
    }
}

pub struct Executor {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn CacheStore>,
    rate_limits: RateLimitTracker,
}

impl Executor {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            config,
            transport,
            cache,
            rate_limits: RateLimitTracker::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Rate-limit counters from the most recent response, if any
    pub async fn last_rate_limit(&self) -> Option<RateLimitStatus> {
        self.rate_limits.latest().await
    }

    /// Execute a GET request against `endpoint` and return the parsed JSON.
    pub async fn execute(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        use_cache: bool,
    ) -> ApiResult<Value> {
        let cache_key = use_cache.then(|| CacheKey::new(endpoint, params));

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key.as_str()).await {
                match serde_json::from_slice(&cached) {
                    Ok(value) => {
                        debug!("Cache hit for {}", endpoint);
                        return Ok(value);
                    }
                    Err(e) => warn!("Ignoring unreadable cache entry for {}: {}", endpoint, e),
                }
            } else {
                debug!("Cache miss for {}", endpoint);
            }
        }

        let url = format!("{}{}", self.config.api_base_url(), endpoint);
        // A zero ceiling still makes one attempt
        let max_attempts = self.config.max_retries.max(1);
        let mut state = RetryState::default();

        loop {
            match self.transport.get(&url, params).await {
                Ok(response) => {
                    let body = self.classify(endpoint, response).await?;
                    let value: Value = serde_json::from_slice(&body)
                        .map_err(|e| ApiError::malformed(StatusCode::OK.as_u16(), e))?;

                    if let Some(key) = &cache_key {
                        self.cache
                            .set(key.as_str(), body, self.config.cache_ttl)
                            .await;
                    }
                    return Ok(value);
                }
                Err(failure) => {
                    let err = ApiError::from(failure);
                    if !err.is_retryable() {
                        error!("GitHub request to {} failed: {}", endpoint, err);
                        return Err(err);
                    }

                    if state.attempt + 1 >= max_attempts {
                        error!(
                            "GitHub request to {} failed after {} attempts: {}",
                            endpoint,
                            state.attempt + 1,
                            err
                        );
                        return Err(ApiError::RetriesExhausted {
                            attempts: state.attempt + 1,
                            last_cause: transient_cause(err),
                        });
                    }

                    let wait = state.next_delay(self.config.retry_delay);
                    warn!(
                        "Request to {} failed (attempt {}/{}): {}. Retrying in {:?}",
                        endpoint,
                        state.attempt + 1,
                        max_attempts,
                        err,
                        wait
                    );
                    sleep(wait).await;
                    state.advance(wait);
                }
            }
        }
    }

    /// Like [`execute`](Self::execute), then deserialize into `T`
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
        use_cache: bool,
    ) -> ApiResult<T> {
        let value = self.execute(endpoint, params, use_cache).await?;
        serde_json::from_value(value).map_err(|e| ApiError::malformed(StatusCode::OK.as_u16(), e))
    }

    /// Map a received response to its body or a taxonomy error
    async fn classify(&self, endpoint: &str, response: RawResponse) -> ApiResult<Vec<u8>> {
        self.rate_limits
            .update_from_headers(&response.headers)
            .await;

        let status = response.status;

        if let RateLimitVerdict::Exceeded { reset_at } =
            rate_limit::interpret(status, &response.headers)
        {
            let err = ApiError::rate_limited(reset_at, Utc::now());
            warn!("GitHub API rate limit exhausted on {}: {}", endpoint, err);
            return Err(err);
        }

        if status == StatusCode::NOT_FOUND {
            debug!("GitHub resource not found: {}", endpoint);
            return Err(ApiError::ResourceNotFound {
                endpoint: endpoint.to_string(),
            });
        }

        if !status.is_success() {
            let cause = error_message(&response);
            error!("GitHub API error: {} - {}", status, cause);
            return Err(ApiError::PermanentTransport {
                status: Some(status.as_u16()),
                cause,
            });
        }

        Ok(response.body)
    }
}

fn transient_cause(err: ApiError) -> String {
    match err {
        ApiError::TransientTransport { cause } => cause,
        other => other.to_string(),
    }
}

/// GitHub error bodies carry a `message` field; fall back to the reason phrase
fn error_message(response: &RawResponse) -> String {
    serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| {
            response
                .status
                .canonical_reason()
                .unwrap_or("Unexpected status")
                .to_string()
        })
}
