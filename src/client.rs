//! VerifyKit API client with retry logic and typed errors.
//!
//! The [`Client`] type is the main entry point for validating addresses.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT},
    error::map_api_error,
    metadata::ResponseMetadata,
    models::{BulkValidationResult, UsageStats, ValidationResult},
    retry::{RetryPolicy, DEFAULT_BASE_DELAY},
    validation, Error, Response, Result,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

const SDK_USER_AGENT: &str = concat!("verifykit-rust-sdk/", env!("CARGO_PKG_VERSION"));

/// Emits a `tracing` debug event only when the client runs in debug mode.
macro_rules! debug_event {
    ($client:expr, $($arg:tt)+) => {
        if $client.inner.config.debug() {
            tracing::debug!($($arg)+);
        }
    };
}

/// Options accepted by the validation endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Skip the SMTP probe for faster results.
    pub skip_smtp: bool,
    /// URL that receives the results asynchronously.
    pub webhook: Option<String>,
}

/// A client for the VerifyKit email validation API.
///
/// Cloning is cheap; clones share the connection pool, the configuration and
/// the [`last_metadata`](Client::last_metadata) slot. Clients created by
/// separate [`ClientBuilder::build`] calls share nothing.
///
/// # Examples
///
/// ```no_run
/// use verifykit::Client;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), verifykit::Error> {
/// let client = Client::builder()
///     .api_key("vk_live_0123456789")
///     .timeout(Duration::from_secs(10))
///     .max_retries(2)
///     .build()?;
///
/// let result = client.validate("user@example.com").await?;
/// println!("{} is {}", result.email, result.reachable);
///
/// let bulk = client
///     .validate_bulk(&["a@example.com", "b@example.com"])
///     .await?;
/// println!("{} valid of {}", bulk.summary.valid, bulk.summary.total);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: ClientConfig,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    last_metadata: Mutex<Option<ResponseMetadata>>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the API key is malformed.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().api_key(api_key).build()
    }

    /// Creates a client from `VERIFYKIT_API_KEY` and, if set,
    /// `VERIFYKIT_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the key is missing or the settings
    /// are invalid.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("VERIFYKIT_API_KEY")
            .map_err(|_| Error::Configuration("VERIFYKIT_API_KEY is not set".to_string()))?;

        let mut builder = ClientBuilder::new().api_key(api_key);
        if let Ok(base_url) = std::env::var("VERIFYKIT_BASE_URL") {
            builder = builder.base_url(base_url);
        }
        builder.build()
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the metadata of the most recent response, or `None` if no
    /// response has been received yet.
    ///
    /// Every request overwrites this slot, error responses included. When
    /// the same client is used from several tasks at once, the value may
    /// belong to any of them; use [`Response::metadata`] to get the metadata
    /// of one specific call.
    pub fn last_metadata(&self) -> Option<ResponseMetadata> {
        self.inner
            .last_metadata
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validates a single email address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without sending anything if the address
    /// is empty or malformed; otherwise any error the API reports.
    pub async fn validate(&self, email: &str) -> Result<Response<ValidationResult>> {
        self.validate_with(email, &ValidateOptions::default()).await
    }

    /// Validates a single email address with extra options.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use verifykit::{Client, ValidateOptions};
    ///
    /// # async fn example() -> Result<(), verifykit::Error> {
    /// let client = Client::new("vk_test_0123456789")?;
    /// let options = ValidateOptions {
    ///     skip_smtp: true,
    ///     ..Default::default()
    /// };
    ///
    /// let result = client.validate_with("user@gmial.com", &options).await?;
    /// if let Some(suggestion) = &result.did_you_mean {
    ///     println!("Did you mean {}?", suggestion);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn validate_with(
        &self,
        email: &str,
        options: &ValidateOptions,
    ) -> Result<Response<ValidationResult>> {
        debug_event!(self, email = email, "Validating single email");

        validation::check_email(email)?;
        validation::check_webhook(options.webhook.as_deref())?;

        let mut body = Map::new();
        body.insert("email".to_string(), Value::from(email));
        let body = request_body(body, options);

        let response = self
            .execute(Method::POST, "/v1/verify", Some(&body))
            .await?
            .map(|data| ValidationResult::from_json(&data));

        debug_event!(
            self,
            email = email,
            valid = response.valid,
            reachable = %response.reachable,
            score = response.score,
            "Email validation complete"
        );

        Ok(response)
    }

    /// Validates up to 1000 email addresses in one request.
    ///
    /// Duplicates are removed before sending, keeping the first occurrence of
    /// each address in place. The results follow that de-duplicated order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without sending anything if the list is
    /// empty, longer than 1000, or contains a malformed address.
    pub async fn validate_bulk<S: AsRef<str>>(
        &self,
        emails: &[S],
    ) -> Result<Response<BulkValidationResult>> {
        self.validate_bulk_with(emails, &ValidateOptions::default())
            .await
    }

    /// Validates a list of addresses with extra options.
    pub async fn validate_bulk_with<S: AsRef<str>>(
        &self,
        emails: &[S],
        options: &ValidateOptions,
    ) -> Result<Response<BulkValidationResult>> {
        debug_event!(self, count = emails.len(), "Validating bulk emails");

        validation::check_bulk(emails)?;
        validation::check_webhook(options.webhook.as_deref())?;

        let (unique, duplicates) = validation::dedupe(emails);
        if duplicates > 0 {
            debug_event!(self, duplicates = duplicates, "Removed duplicate emails");
        }

        let mut body = Map::new();
        body.insert("emails".to_string(), Value::from(unique));
        let body = request_body(body, options);

        let response = self
            .execute(Method::POST, "/v1/verify/bulk", Some(&body))
            .await?
            .map(|data| BulkValidationResult::from_json(&data));

        debug_event!(
            self,
            total = response.summary.total,
            valid = response.summary.valid,
            invalid = response.summary.invalid,
            risky = response.summary.risky,
            processing_time_ms = response.summary.processing_time_ms,
            "Bulk validation complete"
        );

        Ok(response)
    }

    /// Fetches usage statistics for the current billing period.
    pub async fn usage(&self) -> Result<Response<UsageStats>> {
        debug_event!(self, "Fetching usage stats");

        let response = self
            .execute(Method::GET, "/v1/user/usage", None)
            .await?
            .map(|data| UsageStats::from_json(&data));

        debug_event!(
            self,
            current = response.current,
            limit = response.limit,
            remaining = response.remaining,
            "Usage stats retrieved"
        );

        Ok(response)
    }

    /// Sends a request, retrying transient failures per the retry policy.
    ///
    /// Only the final error is returned; intermediate failures are logged in
    /// debug mode.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response<Map<String, Value>>> {
        let start_time = Instant::now();
        let policy = self.inner.retry_policy;
        let mut attempt: u32 = 0;

        loop {
            match self.execute_once(&method, path, body, attempt).await {
                Ok((data, metadata, status)) => {
                    return Ok(Response::new(
                        data,
                        metadata,
                        status,
                        start_time.elapsed(),
                        attempt + 1,
                    ));
                }
                Err(e) => {
                    if !policy.should_retry(attempt, &e) {
                        debug_event!(
                            self,
                            error = %e,
                            attempt = attempt + 1,
                            method = %method,
                            path = path,
                            "Request failed"
                        );
                        return Err(e);
                    }

                    let delay = policy.delay_for(attempt, &e);
                    debug_event!(
                        self,
                        error = %e,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis(),
                        "Retrying request after delay"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Executes a single request attempt.
    async fn execute_once(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        attempt: u32,
    ) -> Result<(Map<String, Value>, ResponseMetadata, StatusCode)> {
        let url = self.inner.config.endpoint(path);
        let timeout = self.inner.config.timeout();

        debug_event!(
            self,
            method = %method,
            url = %url,
            attempt = attempt + 1,
            "Executing HTTP request"
        );

        let mut request = self
            .inner
            .http_client
            .request(method.clone(), url)
            .headers(self.inner.default_headers.clone())
            .timeout(timeout);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::from_transport(e, timeout))?;

        let status = response.status();
        let metadata = ResponseMetadata::from_headers(response.headers());
        self.store_metadata(metadata.clone());

        let raw_body = response
            .text()
            .await
            .map_err(|e| Error::from_transport(e, timeout))?;

        debug_event!(
            self,
            status = status.as_u16(),
            request_id = ?metadata.request_id,
            "Received HTTP response"
        );

        if status.as_u16() >= 400 {
            let error = map_api_error(status.as_u16(), &raw_body, metadata.retry_after());
            debug_event!(
                self,
                status = status.as_u16(),
                code = ?error.code(),
                message = %error.message(),
                "API error"
            );
            return Err(error);
        }

        match serde_json::from_str::<Value>(&raw_body) {
            Ok(Value::Object(data)) => Ok((data, metadata, status)),
            _ => Err(Error::network("Invalid JSON response")),
        }
    }

    fn store_metadata(&self, metadata: ResponseMetadata) {
        *self
            .inner
            .last_metadata
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(metadata);
    }
}

/// Adds the optional fields shared by both validation endpoints.
fn request_body(mut body: Map<String, Value>, options: &ValidateOptions) -> Value {
    if options.skip_smtp {
        body.insert("skip_smtp".to_string(), Value::Bool(true));
    }
    if let Some(webhook) = &options.webhook {
        body.insert("webhook".to_string(), Value::from(webhook.as_str()));
    }
    Value::Object(body)
}

/// Builder for configuring and creating a [`Client`].
///
/// Nothing is checked until [`build`](ClientBuilder::build).
///
/// # Examples
///
/// ```no_run
/// use verifykit::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), verifykit::Error> {
/// let client = ClientBuilder::new()
///     .api_key("vk_test_0123456789")
///     .base_url("https://api.verifykit.io")
///     .timeout(Duration::from_secs(45))
///     .max_retries(5)
///     .debug(true)
///     .header("X-Client-Version", "1.0.0")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    debug: bool,
    headers: Vec<(String, String)>,
    retry_base_delay: Duration,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            debug: false,
            headers: Vec::new(),
            retry_base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Sets the API key. Required.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL for all requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-request timeout. Must be non-zero.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many times a failed request is retried.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enables debug events through `tracing`.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// `Content-Type`, `Authorization` and `User-Agent` are always set by the
    /// client and cannot be overridden.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds several headers sent with every request.
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Sets the delay before the first retry. Later retries double it.
    ///
    /// Defaults to one second.
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Validates the configuration and builds the `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the API key is missing or
    /// malformed, the base URL is invalid, the timeout is zero, or a header
    /// is invalid.
    pub fn build(self) -> Result<Client> {
        let config = ClientConfig::new(
            self.api_key.unwrap_or_default(),
            &self.base_url,
            self.timeout,
            self.max_retries,
            self.debug,
            &self.headers,
        )?;

        let mut default_headers = config.headers().clone();
        let mut authorization = HeaderValue::try_from(format!("Bearer {}", config.api_key()))
            .map_err(|e| Error::Configuration(format!("Invalid API key: {}", e)))?;
        authorization.set_sensitive(true);
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(AUTHORIZATION, authorization);
        default_headers.insert(USER_AGENT, HeaderValue::from_static(SDK_USER_AGENT));

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        let retry_policy = RetryPolicy {
            max_retries: config.max_retries(),
            base_delay: self.retry_base_delay,
        };

        if config.debug() {
            tracing::debug!(
                base_url = %config.base_url(),
                timeout_secs = config.timeout().as_secs_f64(),
                max_retries = config.max_retries(),
                "Client initialized"
            );
        }

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                config,
                default_headers,
                retry_policy,
                last_metadata: Mutex::new(None),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = Client::new("vk_test_12345678901234567890").unwrap();
        let config = client.config();

        assert_eq!(config.base_url().as_str(), "https://api.verifykit.io/");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries(), 3);
        assert!(!config.debug());
        assert!(client.last_metadata().is_none());
    }

    #[test]
    fn test_builder_requires_api_key() {
        match Client::builder().build() {
            Err(Error::Configuration(msg)) => assert_eq!(msg, "API key is required"),
            Err(e) => panic!("Expected Configuration error, got {:?}", e),
            Ok(_) => panic!("Expected Configuration error"),
        }
    }

    #[test]
    fn test_required_headers_cannot_be_overridden() {
        let client = Client::builder()
            .api_key("vk_test_abc")
            .header("Authorization", "Bearer someone-else")
            .header("User-Agent", "impostor")
            .header("X-Custom-Header", "custom-value")
            .build()
            .unwrap();

        let headers = &client.inner.default_headers;
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer vk_test_abc");
        assert_eq!(headers.get(USER_AGENT).unwrap(), SDK_USER_AGENT);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get("x-custom-header").unwrap(), "custom-value");
    }

    #[test]
    fn test_retry_policy_from_builder() {
        let client = Client::builder()
            .api_key("vk_live_abc")
            .max_retries(5)
            .retry_base_delay(Duration::from_millis(250))
            .build()
            .unwrap();

        assert_eq!(client.inner.retry_policy.max_retries, 5);
        assert_eq!(client.inner.retry_policy.base_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_request_body_optional_fields() {
        let mut body = Map::new();
        body.insert("email".to_string(), Value::from("a@x.com"));
        let plain = request_body(body.clone(), &ValidateOptions::default());
        assert_eq!(plain, serde_json::json!({"email": "a@x.com"}));

        let options = ValidateOptions {
            skip_smtp: true,
            webhook: Some("https://example.com/hook".to_string()),
        };
        let full = request_body(body, &options);
        assert_eq!(
            full,
            serde_json::json!({
                "email": "a@x.com",
                "skip_smtp": true,
                "webhook": "https://example.com/hook"
            })
        );
    }

    #[test]
    fn test_user_agent_names_sdk_version() {
        assert!(SDK_USER_AGENT.starts_with("verifykit-rust-sdk/"));
        assert!(SDK_USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
    }
}
