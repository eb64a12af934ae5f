//! Response metadata captured from API headers.

use crate::rate_limit::{header_int, RateLimitInfo};
use http::HeaderMap;
use serde::Serialize;

/// Usage counters reported alongside a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    /// Validations used in the current period (`X-Usage-Current`).
    pub current: u64,
    /// Validations allowed in the current period (`X-Usage-Limit`).
    pub limit: u64,
}

/// Metadata about a single API response.
///
/// Rebuilt from the headers of every response the client receives, including
/// error responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseMetadata {
    /// Server-assigned request id (`X-Request-Id`).
    pub request_id: Option<String>,

    /// Cache status, usually `HIT` or `MISS` (`X-Cache`).
    pub cache: Option<String>,

    /// Server-side processing time in milliseconds (`X-Response-Time`).
    pub response_time: Option<u64>,

    /// Rate limit state, when the response carried rate limit headers.
    pub rate_limit: Option<RateLimitInfo>,

    /// Usage counters, when both usage headers were present.
    pub usage: Option<UsageSnapshot>,
}

impl ResponseMetadata {
    /// Builds metadata from response headers. Header names are matched
    /// case-insensitively.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        };

        let usage = match (
            header_int(headers, "x-usage-current"),
            header_int(headers, "x-usage-limit"),
        ) {
            (Some(current), Some(limit)) => Some(UsageSnapshot { current, limit }),
            _ => None,
        };

        Self {
            request_id: text("x-request-id"),
            cache: text("x-cache"),
            response_time: header_int(headers, "x-response-time"),
            rate_limit: RateLimitInfo::from_headers(headers),
            usage,
        }
    }

    /// Returns `true` if the response was served from the API's cache.
    pub fn is_cache_hit(&self) -> bool {
        self.cache
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("HIT"))
    }

    /// Returns the `Retry-After` hint, if any.
    pub fn retry_after(&self) -> Option<u64> {
        self.rate_limit.and_then(|r| r.retry_after)
    }
}
