//! Error types for VerifyKit API calls.
//!
//! Every failure the client can surface is a variant of [`Error`]. Errors that
//! originate from the API (or from the local pre-flight checks that mirror the
//! API's own validation) carry an [`ApiError`] payload with the message, the
//! machine-readable error code and any request id or documentation link the
//! server supplied.

use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Upstream label that turns a 429 into a quota error instead of a rate limit.
pub(crate) const MONTHLY_LIMIT_LABEL: &str = "Monthly Limit Exceeded";

/// Details attached to every API-originated error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Human readable message.
    pub message: String,
    /// Machine error code, taken from the upstream `error` field.
    pub code: Option<String>,
    /// HTTP status code. `None` for errors raised before any request was sent.
    pub status: Option<u16>,
    /// Request id reported by the server.
    pub request_id: Option<String>,
    /// Link to documentation about this error.
    pub documentation: Option<String>,
}

impl ApiError {
    /// Creates an error payload with only a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
            status: None,
            request_id: None,
            documentation: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => f.write_str(&self.message),
        }
    }
}

/// The main error type for VerifyKit API calls.
///
/// # Examples
///
/// ```no_run
/// use verifykit::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::new("vk_test_0123456789")?;
///
/// match client.validate("user@example.com").await {
///     Ok(result) => println!("valid: {}", result.valid),
///     Err(Error::RateLimit { retry_after, .. }) => {
///         eprintln!("slow down, retry after {:?}s", retry_after);
///     }
///     Err(Error::QuotaExceeded(details)) => {
///         eprintln!("monthly quota used up: {}", details.message);
///     }
///     Err(e) => eprintln!("validation failed: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The client was configured with invalid settings.
    ///
    /// Only produced by [`ClientBuilder::build`](crate::ClientBuilder::build);
    /// never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The input was rejected, either locally before sending or by the server
    /// with a 4xx status.
    #[error("Validation error: {0}")]
    Validation(ApiError),

    /// The API key was rejected (401).
    #[error("Authentication failed: {0}")]
    Authentication(ApiError),

    /// The requested resource does not exist (404).
    #[error("Not found: {0}")]
    NotFound(ApiError),

    /// Too many requests in the current window (429).
    #[error("Rate limit exceeded: {error}")]
    RateLimit {
        /// Error details from the response body.
        error: ApiError,
        /// Seconds to wait before retrying, from the `Retry-After` header.
        retry_after: Option<u64>,
    },

    /// The monthly validation allowance is used up. Never retried.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(ApiError),

    /// The server failed (5xx).
    #[error("Server error: {0}")]
    Server(ApiError),

    /// An API error whose status does not fall in any other category.
    #[error("API error: {0}")]
    Api(ApiError),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {timeout:?}")]
    Timeout {
        /// The configured per-request timeout.
        timeout: Duration,
        /// The underlying transport error.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A transport-level failure (connection refused, DNS, unreadable or
    /// non-JSON response body).
    #[error("Network error: {message}")]
    Network {
        /// Description of what failed.
        message: String,
        /// The underlying transport error, if any.
        #[source]
        source: Option<reqwest::Error>,
    },
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>, code: &str) -> Self {
        Error::Validation(ApiError::new(message, code))
    }

    pub(crate) fn network(message: impl Into<String>) -> Self {
        Error::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Classifies a `reqwest` transport error as a timeout or network failure.
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Error::Timeout {
                timeout,
                source: Some(err),
            }
        } else {
            Error::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }

    fn details(&self) -> Option<&ApiError> {
        match self {
            Error::Validation(d)
            | Error::Authentication(d)
            | Error::NotFound(d)
            | Error::QuotaExceeded(d)
            | Error::Server(d)
            | Error::Api(d) => Some(d),
            Error::RateLimit { error, .. } => Some(error),
            Error::Configuration(_) | Error::Timeout { .. } | Error::Network { .. } => None,
        }
    }

    /// Returns the human readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Error::Configuration(message) => message.clone(),
            Error::Network { message, .. } => message.clone(),
            Error::Timeout { .. } => "Request timeout".to_string(),
            other => other
                .details()
                .map(|d| d.message.clone())
                .unwrap_or_default(),
        }
    }

    /// Returns the machine error code.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Configuration(_) => Some("INVALID_CONFIG"),
            Error::Timeout { .. } => Some("TIMEOUT"),
            other => other.details().and_then(|d| d.code.as_deref()),
        }
    }

    /// Returns the HTTP status code if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        self.details().and_then(|d| d.status)
    }

    /// Returns the request id reported by the server.
    pub fn request_id(&self) -> Option<&str> {
        self.details().and_then(|d| d.request_id.as_deref())
    }

    /// Returns the documentation link reported by the server.
    pub fn documentation(&self) -> Option<&str> {
        self.details().and_then(|d| d.documentation.as_deref())
    }

    /// Returns the `Retry-After` hint of a rate limit error, in seconds.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Error::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Returns `true` if this kind of error is retried by the client.
    ///
    /// Network errors, timeouts, rate limits and server errors are retryable.
    /// Quota, authentication, validation and not-found errors are not.
    ///
    /// # Examples
    ///
    /// ```
    /// use verifykit::{ApiError, Error};
    ///
    /// let err = Error::Server(ApiError::new("boom", "Internal Server Error"));
    /// assert!(err.is_retryable());
    ///
    /// let err = Error::QuotaExceeded(ApiError::new("limit", "Monthly Limit Exceeded"));
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network { .. } | Error::Timeout { .. } | Error::RateLimit { .. } => true,
            Error::Server(_) => true,
            Error::Api(d) => d.status.is_some_and(|s| s >= 500),
            Error::Configuration(_)
            | Error::Validation(_)
            | Error::Authentication(_)
            | Error::NotFound(_)
            | Error::QuotaExceeded(_) => false,
        }
    }
}

/// Maps an error response into a typed [`Error`].
///
/// `raw_body` that is not a JSON object is replaced by a generic
/// "Unknown Error" body. `retry_after` is the hint captured from the response
/// headers and is only attached to rate limit errors.
pub(crate) fn map_api_error(status: u16, raw_body: &str, retry_after: Option<u64>) -> Error {
    let body = match serde_json::from_str::<Value>(raw_body) {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = serde_json::Map::new();
            map.insert("error".into(), Value::from("Unknown Error"));
            map.insert("message".into(), Value::from("An unknown error occurred"));
            map
        }
    };

    let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);

    let details = ApiError {
        message: text("message").unwrap_or_else(|| "Unknown error".to_string()),
        code: text("error"),
        status: Some(status),
        request_id: text("requestId"),
        documentation: text("documentation"),
    };

    match status {
        429 if details.code.as_deref() == Some(MONTHLY_LIMIT_LABEL) => {
            Error::QuotaExceeded(details)
        }
        429 => Error::RateLimit {
            error: details,
            retry_after,
        },
        401 => Error::Authentication(details),
        404 => Error::NotFound(details),
        400..=499 => Error::Validation(details),
        s if s >= 500 => Error::Server(details),
        _ => Error::Api(details),
    }
}

/// A specialized `Result` type for VerifyKit API calls.
pub type Result<T> = std::result::Result<T, Error>;
