use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";
pub const USED_HEADER: &str = "x-ratelimit-used";

/// Classification of a single response with respect to the rate limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitVerdict {
    Ok,
    /// Quota exhausted: remaining is zero until `reset_at`
    Exceeded { reset_at: DateTime<Utc> },
    /// 403 for some other reason (permissions, blocked resource, ...)
    Unrelated403,
}

/// Decide whether a response is a rate-limit rejection.
///
/// GitHub answers 403 both for an exhausted quota and for plain permission
/// failures; only a 403 whose remaining counter is zero or missing is a
/// rate limit.
pub fn interpret(status: StatusCode, headers: &HeaderMap) -> RateLimitVerdict {
    if status != StatusCode::FORBIDDEN {
        return RateLimitVerdict::Ok;
    }

    // A 403 without a readable counter counts as exhausted
    match header_number::<u64>(headers, REMAINING_HEADER).unwrap_or(0) {
        0 => {
            let reset_at = header_number::<i64>(headers, RESET_HEADER)
                .and_then(|reset| DateTime::from_timestamp(reset, 0))
                .unwrap_or_else(Utc::now);
            RateLimitVerdict::Exceeded { reset_at }
        }
        _ => RateLimitVerdict::Unrelated403,
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Rate-limit counters as reported by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp when the window resets
    pub reset: i64,
    #[serde(default)]
    pub used: u32,
}

impl RateLimitStatus {
    /// Read the counters GitHub attaches to every response.
    /// Returns `None` when the remaining counter is absent.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_number(headers, REMAINING_HEADER)?;
        let limit = header_number(headers, LIMIT_HEADER).unwrap_or(0);
        Some(Self {
            limit,
            remaining,
            reset: header_number(headers, RESET_HEADER).unwrap_or(0),
            used: header_number(headers, USED_HEADER)
                .unwrap_or_else(|| limit.saturating_sub(remaining)),
        })
    }

    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset, 0)
    }
}

/// Remembers the most recent rate-limit headers seen by the executor
#[derive(Clone, Default)]
pub struct RateLimitTracker {
    latest: Arc<RwLock<Option<RateLimitStatus>>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn update_from_headers(&self, headers: &HeaderMap) {
        let Some(status) = RateLimitStatus::from_headers(headers) else {
            return;
        };

        debug!(
            "Rate limit updated: {}/{} (resets at {})",
            status.remaining, status.limit, status.reset
        );
        *self.latest.write().await = Some(status);
    }

    pub async fn latest(&self) -> Option<RateLimitStatus> {
        *self.latest.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_exhausted_403_is_rate_limit() {
        let h = headers(&[(REMAINING_HEADER, "0"), (RESET_HEADER, "1700000000")]);
        assert_eq!(
            interpret(StatusCode::FORBIDDEN, &h),
            RateLimitVerdict::Exceeded {
                reset_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap()
            }
        );
    }

    #[test]
    fn test_403_with_quota_left_is_unrelated() {
        let h = headers(&[(REMAINING_HEADER, "42"), (RESET_HEADER, "1700000000")]);
        assert_eq!(
            interpret(StatusCode::FORBIDDEN, &h),
            RateLimitVerdict::Unrelated403
        );
    }

    #[test]
    fn test_403_without_counter_is_rate_limit() {
        let h = headers(&[(RESET_HEADER, "1700000000")]);
        assert_eq!(
            interpret(StatusCode::FORBIDDEN, &h),
            RateLimitVerdict::Exceeded {
                reset_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap()
            }
        );

        assert!(matches!(
            interpret(StatusCode::FORBIDDEN, &HeaderMap::new()),
            RateLimitVerdict::Exceeded { .. }
        ));
    }

    #[test]
    fn test_other_statuses_are_ok() {
        let h = headers(&[(REMAINING_HEADER, "0"), (RESET_HEADER, "1700000000")]);
        for status in [StatusCode::OK, StatusCode::NOT_FOUND, StatusCode::UNAUTHORIZED] {
            assert_eq!(interpret(status, &h), RateLimitVerdict::Ok);
        }
    }

    #[test]
    fn test_status_from_headers() {
        let h = headers(&[
            (LIMIT_HEADER, "5000"),
            (REMAINING_HEADER, "4850"),
            (RESET_HEADER, "1638360000"),
        ]);
        let status = RateLimitStatus::from_headers(&h).unwrap();
        assert_eq!(
            status,
            RateLimitStatus {
                limit: 5000,
                remaining: 4850,
                reset: 1_638_360_000,
                used: 150,
            }
        );
        assert!(RateLimitStatus::from_headers(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn test_tracker_keeps_latest() {
        let tracker = RateLimitTracker::new();
        assert!(tracker.latest().await.is_none());

        tracker
            .update_from_headers(&headers(&[(REMAINING_HEADER, "10"), (LIMIT_HEADER, "60")]))
            .await;
        tracker.update_from_headers(&HeaderMap::new()).await;

        let latest = tracker.latest().await.unwrap();
        assert_eq!(latest.remaining, 10);
        assert_eq!(latest.used, 50);
    }
}
