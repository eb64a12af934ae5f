//! Rate limit header parsing.
//!
//! The API reports its short-window rate limit through `X-RateLimit-*`
//! headers and, when a request was throttled, a `Retry-After` header.

use http::HeaderMap;
use serde::Serialize;
use std::time::SystemTime;

/// Rate limit state reported by the most recent response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    /// Requests allowed in the current window (`X-RateLimit-Limit`).
    pub limit: u64,

    /// Requests left in the current window (`X-RateLimit-Remaining`).
    pub remaining: u64,

    /// Unix timestamp at which the window resets (`X-RateLimit-Reset`).
    pub reset: u64,

    /// Seconds to wait before retrying (`Retry-After`).
    pub retry_after: Option<u64>,
}

impl RateLimitInfo {
    /// Extracts rate limit information from HTTP response headers.
    ///
    /// Returns `None` when neither `X-RateLimit-Limit` nor `Retry-After` is
    /// present. Missing or unparsable counters default to zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use verifykit::RateLimitInfo;
    /// use http::HeaderMap;
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert("x-ratelimit-limit", "100".parse().unwrap());
    /// headers.insert("x-ratelimit-remaining", "0".parse().unwrap());
    /// headers.insert("retry-after", "60".parse().unwrap());
    ///
    /// let info = RateLimitInfo::from_headers(&headers).unwrap();
    /// assert_eq!(info.limit, 100);
    /// assert_eq!(info.retry_after, Some(60));
    /// ```
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let retry_after = parse_retry_after(headers);

        if !headers.contains_key("x-ratelimit-limit") && retry_after.is_none() {
            return None;
        }

        Some(Self {
            limit: header_int(headers, "x-ratelimit-limit").unwrap_or(0),
            remaining: header_int(headers, "x-ratelimit-remaining").unwrap_or(0),
            reset: header_int(headers, "x-ratelimit-reset").unwrap_or(0),
            retry_after,
        })
    }

    /// Returns `true` if the window is used up.
    pub fn is_exhausted(&self) -> bool {
        self.limit > 0 && self.remaining == 0
    }
}

/// Reads a header as an integer, accepting a leading number followed by
/// trailing text such as a unit (`"120ms"`).
pub(crate) fn header_int(headers: &HeaderMap, name: &str) -> Option<u64> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    let digits: &str = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value, |end| &value[..end]);
    digits.parse().ok()
}

/// Parses the Retry-After header.
///
/// Supports both delay-seconds and HTTP-date formats. Dates in the past yield
/// zero.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    let header = headers.get("retry-after")?.to_str().ok()?.trim();

    if let Ok(seconds) = header.parse::<u64>() {
        return Some(seconds);
    }

    let date_time = httpdate::parse_http_date(header).ok()?;
    Some(
        date_time
            .duration_since(SystemTime::now())
            .map(|d| d.as_secs())
            .unwrap_or(0),
    )
}
