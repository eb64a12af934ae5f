//! # VerifyKit - email validation API client
//!
//! An async client for the VerifyKit email validation service, built on top
//! of `reqwest`. Addresses are checked locally for obvious mistakes, then sent
//! to the API, which performs the syntax, MX, SMTP and disposable-provider
//! checks and reports a deliverability verdict.
//!
//! ## Quick Start
//!
//! ```no_run
//! use verifykit::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), verifykit::Error> {
//!     let client = Client::new("vk_live_0123456789")?;
//!
//!     // Validate a single email
//!     let result = client.validate("user@example.com").await?;
//!     println!("{}: valid={} reachable={}", result.email, result.valid, result.reachable);
//!
//!     // Validate a list
//!     let bulk = client
//!         .validate_bulk(&["user1@example.com", "user2@example.com"])
//!         .await?;
//!     println!("Valid: {}/{}", bulk.summary.valid, bulk.summary.total);
//!
//!     // Check the monthly allowance
//!     let usage = client.usage().await?;
//!     println!("Used {} of {}", usage.current, usage.limit);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Typed results** - [`ValidationResult`], [`BulkValidationResult`] and [`UsageStats`]
//! - **Typed errors** - one [`Error`] variant per failure kind, carrying the server's code, request id and documentation link
//! - **Automatic retries** - exponential backoff (1s, 2s, 4s, ...) for network, timeout, rate limit and 5xx failures; `Retry-After` is honored
//! - **Response metadata** - request id, cache status, rate limit and usage headers on every [`Response`]
//! - **Debug logging** - structured `tracing` events when built with `debug(true)`
//!
//! ## Error Handling
//!
//! ```no_run
//! use verifykit::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::new("vk_test_0123456789")?;
//! match client.validate("user@example.com").await {
//!     Ok(result) => println!("Score: {}", result.score),
//!     Err(Error::Validation(details)) => eprintln!("Bad input: {}", details.message),
//!     Err(Error::QuotaExceeded(details)) => eprintln!("Out of quota: {}", details.message),
//!     Err(e) if e.is_retryable() => eprintln!("Gave up after retries: {}", e),
//!     Err(e) => eprintln!("Failed: {} (request id {:?})", e, e.request_id()),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
mod error;
pub mod metadata;
mod models;
pub mod rate_limit;
mod response;
pub mod retry;
pub mod validation;

pub use client::{Client, ClientBuilder, ValidateOptions};
pub use config::ClientConfig;
pub use error::{ApiError, Error, Result};
pub use metadata::{ResponseMetadata, UsageSnapshot};
pub use models::{
    BulkValidationResult, BulkValidationSummary, MxValidation, Reachable, SmtpValidation,
    SyntaxValidation, UsageStats, ValidationResult,
};
pub use rate_limit::RateLimitInfo;
pub use response::Response;
pub use retry::RetryPolicy;
