//! Client configuration and its validation.

use crate::{validation::is_valid_http_url, Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::time::Duration;
use url::Url;

/// The production API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.verifykit.io";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Prefixes a well-formed API key starts with.
pub const API_KEY_PREFIXES: [&str; 2] = ["vk_live_", "vk_test_"];

/// Validated, immutable client configuration.
///
/// Created by [`ClientBuilder::build`](crate::ClientBuilder::build). The
/// `Debug` output shows only the key's prefix.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: Url,
    timeout: Duration,
    max_retries: u32,
    debug: bool,
    headers: HeaderMap,
}

impl ClientConfig {
    /// Validates raw settings. No network access happens here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the API key is empty or lacks a
    /// recognized prefix, the base URL is malformed, the timeout is zero, or a
    /// header name or value is invalid.
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
        debug: bool,
        headers: &[(String, String)],
    ) -> Result<Self> {
        let api_key = api_key.into();

        if api_key.is_empty() {
            return Err(Error::Configuration("API key is required".to_string()));
        }

        if !is_valid_api_key(&api_key) {
            return Err(Error::Configuration(
                "Invalid API key format. API key must start with vk_live_ or vk_test_".to_string(),
            ));
        }

        if !is_valid_http_url(base_url) {
            return Err(Error::Configuration(format!(
                "Invalid base URL: {}",
                base_url
            )));
        }
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Configuration(format!("Invalid base URL: {}", e)))?;

        if timeout.is_zero() {
            return Err(Error::Configuration(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
            header_map.insert(name, value);
        }

        Ok(Self {
            api_key,
            base_url,
            timeout,
            max_retries,
            debug,
            headers: header_map,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Extra headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Joins an API path onto the base URL, keeping any path prefix the base
    /// URL already has.
    pub(crate) fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &redact_api_key(&self.api_key))
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("debug", &self.debug)
            .field("headers", &self.headers)
            .finish()
    }
}

fn redact_api_key(api_key: &str) -> String {
    let prefix = API_KEY_PREFIXES
        .iter()
        .find(|prefix| api_key.starts_with(*prefix))
        .copied()
        .unwrap_or("");
    format!("{}***", prefix)
}

/// Returns `true` if the key starts with a live or test prefix.
pub fn is_valid_api_key(api_key: &str) -> bool {
    API_KEY_PREFIXES
        .iter()
        .any(|prefix| api_key.starts_with(prefix))
}
