//! Back-off hints carried by 429 and 503 responses.
//!
//! Redmine itself rarely throttles, but the reverse proxies in front of it
//! (nginx, Cloudflare, hosted plans) answer with `Retry-After` or
//! `X-RateLimit-*` headers. The transport attaches what it finds to
//! [`Error::ServiceUnavailable`](crate::Error::ServiceUnavailable) so a
//! caller-side [`RetryPolicy`](crate::retry::RetryPolicy) can honour it.

use http::HeaderMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Back-off information extracted from response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// How long the server asked us to wait (`Retry-After`).
    pub retry_after: Option<Duration>,

    /// When the current rate limit window resets (`X-RateLimit-Reset`).
    pub reset_at: Option<SystemTime>,
}

impl RateLimitInfo {
    /// Reads back-off headers from a response.
    ///
    /// Returns `None` when the response carries no usable hint.
    ///
    /// # Examples
    ///
    /// ```
    /// use redmine_client::rate_limit::RateLimitInfo;
    /// use http::HeaderMap;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("retry-after", "120".parse().unwrap());
    ///
    /// let info = RateLimitInfo::from_headers(&headers).unwrap();
    /// assert_eq!(info.retry_after, Some(std::time::Duration::from_secs(120)));
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let info = Self {
            retry_after: parse_retry_after(headers),
            reset_at: parse_reset(headers),
        };

        if info.retry_after.is_none() && info.reset_at.is_none() {
            None
        } else {
            Some(info)
        }
    }

    /// Returns the delay to honour before the next attempt, capped by `max_wait`.
    ///
    /// `Retry-After` wins over the reset timestamp.
    pub fn delay(&self, max_wait: Duration) -> Option<Duration> {
        if let Some(retry_after) = self.retry_after {
            return Some(retry_after.min(max_wait));
        }

        let until_reset = self.reset_at?.duration_since(SystemTime::now()).ok()?;
        Some(until_reset.min(max_wait))
    }
}

/// `Retry-After` is either delay-seconds or an HTTP date.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?;

    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = httpdate::parse_http_date(value).ok()?;
    at.duration_since(SystemTime::now()).ok()
}

fn parse_reset(headers: &HeaderMap) -> Option<SystemTime> {
    let value = headers.get("x-ratelimit-reset")?.to_str().ok()?;
    let timestamp = value.trim().parse::<u64>().ok()?;
    Some(UNIX_EPOCH + Duration::from_secs(timestamp))
}
