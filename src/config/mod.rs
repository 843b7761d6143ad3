use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Literal defaults for every tunable, kept in one place
pub mod defaults {
    pub const BASE_URL: &str = "https://api.github.com";
    pub const TIMEOUT_SECS: u64 = 10;
    pub const CACHE_TTL_SECS: u64 = 1800;
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_DELAY_SECS: f64 = 1.0;
    pub const DATABASE_URL: &str = "sqlite:./data/reposcout.db";
    pub const MAX_FILES: usize = 50;
    pub const MAX_RESULTS: usize = 10;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub client: ClientConfig,
    pub database: DatabaseConfig,
}

/// GitHub client configuration. Fixed once the client is built.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Wait before the first retry; doubles on each subsequent one
    pub retry_delay: Duration,
    pub cache_ttl: Duration,
    /// Optional personal access token for increased rate limits
    pub token: Option<String>,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
            max_retries: defaults::MAX_RETRIES,
            retry_delay: Duration::from_secs_f64(defaults::RETRY_DELAY_SECS),
            cache_ttl: Duration::from_secs(defaults::CACHE_TTL_SECS),
            token: None,
            user_agent: format!("reposcout/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.to_string(),
        }
    }
}

// Hand-written so the token never shows up in debug output
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("cache_ttl", &self.cache_ttl)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a client configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let fallback = Self::default();

        let base_url = std::env::var("GITHUB_API_BASE_URL").unwrap_or(fallback.base_url);
        let timeout_secs: u64 = parse_env("GITHUB_API_TIMEOUT", defaults::TIMEOUT_SECS)?;
        let cache_ttl_secs: u64 = parse_env("GITHUB_CACHE_TIMEOUT", defaults::CACHE_TTL_SECS)?;
        let max_retries = parse_env("GITHUB_API_MAX_RETRIES", defaults::MAX_RETRIES)?;
        let retry_delay = retry_delay_from_secs(parse_env(
            "GITHUB_API_RETRY_DELAY",
            defaults::RETRY_DELAY_SECS,
        )?)?;

        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            retry_delay,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            token,
            user_agent: fallback.user_agent,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Base URL without a trailing slash, ready for endpoint concatenation
    pub fn api_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Upper bound on the total backoff sleep of one request:
    /// `retry_delay * (2^(max_retries - 1) - 1)`
    pub fn max_backoff(&self) -> Duration {
        let sleeps = self.max_retries.saturating_sub(1);
        (0..sleeps).fold(Duration::ZERO, |total, attempt| {
            total.saturating_add(self.retry_delay.saturating_mul(2u32.saturating_pow(attempt)))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::Config("Max retries must be at least 1".to_string()));
        }

        if self.timeout.is_zero() {
            return Err(Error::Config("Timeout must be non-zero".to_string()));
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid GITHUB_API_BASE_URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported scheme in GITHUB_API_BASE_URL: {}",
                url.scheme()
            )));
        }

        Ok(())
    }
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DATABASE_URL.to_string());

        Ok(Settings {
            client: ClientConfig::from_env()?,
            database: DatabaseConfig { url: database_url },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.client.validate()?;

        if self.database.url.trim().is_empty() {
            return Err(Error::Config("DATABASE_URL must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Negative, NaN and out-of-range values are configuration errors
fn retry_delay_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::Config(format!("Invalid GITHUB_API_RETRY_DELAY value: {e}")))
}

fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid {name} value"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings {
            client: ClientConfig::default(),
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
        };

        assert!(settings.validate().is_ok());

        settings.client.max_retries = 0;
        assert!(settings.validate().is_err());

        settings.client.max_retries = 3;
        settings.client.base_url = "not a url".to_string();
        assert!(settings.validate().is_err());

        settings.client.base_url = "ftp://example.com".to_string();
        assert!(settings.validate().is_err());

        settings.client.base_url = "http://127.0.0.1:8080/".to_string();
        settings.client.timeout = Duration::ZERO;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url(), "https://api.github.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.cache_ttl, Duration::from_secs(1800));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
        assert!(!config.is_authenticated());
        assert!(config.user_agent.starts_with("reposcout/"));
    }

    #[test]
    fn test_max_backoff() {
        let config = ClientConfig::default().with_retries(4, Duration::from_millis(100));
        // Sleeps happen before attempts 2..=4: 100 + 200 + 400
        assert_eq!(config.max_backoff(), Duration::from_millis(700));

        let config = ClientConfig::default().with_retries(1, Duration::from_secs(5));
        assert_eq!(config.max_backoff(), Duration::ZERO);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::default().with_token("ghp_supersecret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ghp_supersecret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_retry_delay_bounds() {
        assert_eq!(
            retry_delay_from_secs(0.25).unwrap(),
            Duration::from_millis(250)
        );
        assert_eq!(retry_delay_from_secs(0.0).unwrap(), Duration::ZERO);

        for bad in [1e20, -1.0, f64::NAN, f64::INFINITY] {
            let err = retry_delay_from_secs(bad).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "value: {bad}");
        }
    }

    #[test]
    fn test_api_base_url_trims_slash() {
        let config = ClientConfig::default().with_base_url("http://localhost:1234/");
        assert_eq!(config.api_base_url(), "http://localhost:1234");
    }
}
