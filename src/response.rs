//! Response wrapper that carries decoded data together with its metadata.
//!
//! Every successful call returns a [`Response`] so the metadata of that exact
//! request travels with its result, rather than only through the client's
//! shared [`last_metadata`](crate::Client::last_metadata) slot.

use crate::metadata::ResponseMetadata;
use http::StatusCode;
use std::time::Duration;

/// A decoded API result plus details about the HTTP exchange.
///
/// Dereferences to the decoded data.
///
/// # Examples
///
/// ```no_run
/// use verifykit::Client;
///
/// # async fn example() -> Result<(), verifykit::Error> {
/// let client = Client::new("vk_test_0123456789")?;
/// let response = client.validate("user@example.com").await?;
///
/// println!("Valid: {}", response.valid);
/// println!("Request id: {:?}", response.metadata.request_id);
/// println!("Attempts: {}", response.attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response data.
    pub data: T,

    /// Metadata parsed from the response headers.
    pub metadata: ResponseMetadata,

    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// Total time from the first attempt until the response was received,
    /// including retry delays.
    pub latency: Duration,

    /// The number of attempts made. `1` means no retry was needed.
    pub attempts: u32,
}

impl<T> Response<T> {
    /// Creates a new `Response`.
    pub fn new(
        data: T,
        metadata: ResponseMetadata,
        status: StatusCode,
        latency: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            data,
            metadata,
            status,
            latency,
            attempts,
        }
    }

    /// Maps the response data to a different type, keeping the metadata.
    ///
    /// # Examples
    ///
    /// ```
    /// # use verifykit::{Response, ResponseMetadata};
    /// # use http::StatusCode;
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     42,
    ///     ResponseMetadata::default(),
    ///     StatusCode::OK,
    ///     Duration::from_millis(100),
    ///     1,
    /// );
    ///
    /// let string_response = response.map(|n| n.to_string());
    /// assert_eq!(string_response.data, "42");
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            metadata: self.metadata,
            status: self.status,
            latency: self.latency,
            attempts: self.attempts,
        }
    }

    /// Returns `true` if the request required retries.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Consumes the response, returning only the data.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
