use crate::github::transport::TransportFailure;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Failure kinds raised by the GitHub client.
///
/// Nothing else crosses the client boundary: every transport, decoding and
/// classification failure is mapped into one of these before it is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Quota exhausted. Wait until `reset_at` or fall back to cached data.
    #[error("GitHub API rate limit exceeded. Resets in {} seconds", .wait.as_secs())]
    RateLimitExceeded {
        reset_at: DateTime<Utc>,
        wait: Duration,
    },

    #[error("Resource not found: {endpoint}")]
    ResourceNotFound { endpoint: String },

    /// Timeout or connection failure. The retry loop absorbs these and
    /// surfaces `RetriesExhausted` once attempts run out.
    #[error("Transient transport error: {cause}")]
    TransientTransport { cause: String },

    #[error("{}", permanent_message(.status, .cause))]
    PermanentTransport { status: Option<u16>, cause: String },

    #[error("Request failed after {attempts} attempts: {last_cause}")]
    RetriesExhausted { attempts: u32, last_cause: String },
}

fn permanent_message(status: &Option<u16>, cause: &str) -> String {
    match status {
        Some(status) => format!("GitHub API error (HTTP {status}): {cause}"),
        None => format!("GitHub API request failed: {cause}"),
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<TransportFailure> for ApiError {
    fn from(failure: TransportFailure) -> Self {
        if failure.is_transient() {
            ApiError::TransientTransport {
                cause: failure.to_string(),
            }
        } else {
            ApiError::PermanentTransport {
                status: None,
                cause: failure.to_string(),
            }
        }
    }
}

impl ApiError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::TransientTransport { .. })
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ApiError::RateLimitExceeded { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ResourceNotFound { .. })
    }

    /// Build a rate-limit error from the reset epoch, measuring the wait from `now`.
    pub fn rate_limited(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let wait = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
        ApiError::RateLimitExceeded { reset_at, wait }
    }

    pub(crate) fn malformed(status: u16, cause: impl std::fmt::Display) -> Self {
        ApiError::PermanentTransport {
            status: Some(status),
            cause: format!("malformed response payload: {cause}"),
        }
    }

    /// Short message for end users. Never includes response bodies or URLs
    /// beyond the endpoint path the caller asked for.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::RateLimitExceeded { wait, .. } => format!(
                "GitHub rate limit reached, try again in {} seconds",
                wait.as_secs()
            ),
            ApiError::ResourceNotFound { endpoint } => {
                format!("Not found on GitHub: {endpoint}")
            }
            ApiError::TransientTransport { .. } => "GitHub is temporarily unreachable".to_string(),
            ApiError::PermanentTransport {
                status: Some(status),
                ..
            } => format!("GitHub rejected the request (HTTP {status})"),
            ApiError::PermanentTransport { status: None, .. } => {
                "GitHub request could not be completed".to_string()
            }
            ApiError::RetriesExhausted { attempts, .. } => {
                format!("GitHub did not respond after {attempts} attempts")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_are_retryable() {
        assert!(ApiError::TransientTransport {
            cause: "timeout".to_string()
        }
        .is_retryable());

        let not_retryable = [
            ApiError::rate_limited(Utc::now(), Utc::now()),
            ApiError::ResourceNotFound {
                endpoint: "/repos/a/b".to_string(),
            },
            ApiError::PermanentTransport {
                status: Some(500),
                cause: "boom".to_string(),
            },
            ApiError::RetriesExhausted {
                attempts: 3,
                last_cause: "timeout".to_string(),
            },
        ];
        for err in not_retryable {
            assert!(!err.is_retryable(), "{err:?} must not be retryable");
        }
    }

    #[test]
    fn test_rate_limited_wait_is_clamped() {
        let now = Utc::now();
        let err = ApiError::rate_limited(now - chrono::Duration::seconds(30), now);
        match err {
            ApiError::RateLimitExceeded { wait, .. } => assert_eq!(wait, Duration::ZERO),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = ApiError::rate_limited(now + chrono::Duration::seconds(90), now);
        assert_eq!(
            err.to_string(),
            "GitHub API rate limit exceeded. Resets in 90 seconds"
        );
    }

    #[test]
    fn test_transport_failures_map_into_taxonomy() {
        let err = ApiError::from(TransportFailure::Timeout("deadline".to_string()));
        assert!(err.is_retryable());
        assert_eq!(
            err,
            ApiError::TransientTransport {
                cause: "request timed out: deadline".to_string()
            }
        );

        assert!(ApiError::from(TransportFailure::Connect("refused".to_string())).is_retryable());

        let err = ApiError::from(TransportFailure::Other("bad header".to_string()));
        assert!(!err.is_retryable());
        assert!(matches!(err, ApiError::PermanentTransport { status: None, .. }));
    }

    #[test]
    fn test_user_message_hides_cause() {
        let err = ApiError::PermanentTransport {
            status: Some(401),
            cause: "Bad credentials for token ghp_secret".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("401"));
        assert!(!msg.contains("ghp_secret"));
    }
}
