//! Basic example demonstrating single, bulk and usage calls.
//!
//! This example shows how to:
//! - Create a client from the environment with debug logging
//! - Validate one address and read its typo suggestion
//! - Validate a list of addresses
//! - Inspect response metadata and handle typed errors
//!
//! Run with: `VERIFYKIT_API_KEY=vk_test_... cargo run --example basic_usage`

use verifykit::{Client, Error, ValidateOptions};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("verifykit=debug")
        .init();

    let client = Client::builder()
        .api_key(std::env::var("VERIFYKIT_API_KEY").unwrap_or_default())
        .debug(true)
        .build()?;

    println!("=== Single Validation ===");
    let result = client.validate("john@gmial.com").await?;
    println!("Email: {}", result.email);
    println!("Valid: {}", result.valid);
    println!("Reachable: {}", result.reachable);
    println!("Score: {:.2}", result.score);
    if let Some(suggestion) = &result.did_you_mean {
        println!("Did you mean: {}", suggestion);
    }
    println!("Request id: {:?}", result.metadata.request_id);
    println!();

    println!("=== Bulk Validation ===");
    let options = ValidateOptions {
        skip_smtp: true,
        ..Default::default()
    };
    let bulk = client
        .validate_bulk_with(
            &["user1@example.com", "user2@example.com", "user1@example.com"],
            &options,
        )
        .await?;
    for item in &bulk.results {
        println!("  {} -> {}", item.email, item.reachable);
    }
    println!(
        "Total {} / valid {} / invalid {} / risky {} in {}ms",
        bulk.summary.total,
        bulk.summary.valid,
        bulk.summary.invalid,
        bulk.summary.risky,
        bulk.summary.processing_time_ms
    );
    println!();

    println!("=== Usage ===");
    let usage = client.usage().await?;
    println!(
        "Used {} of {} ({:.1}%), {} remaining",
        usage.current, usage.limit, usage.percentage, usage.remaining
    );
    if let Some(rate_limit) = client.last_metadata().and_then(|m| m.rate_limit) {
        println!("Rate limit: {}/{}", rate_limit.remaining, rate_limit.limit);
    }
    println!();

    println!("=== Error Handling ===");
    match client.validate("not-an-email").await {
        Ok(_) => println!("Unexpected success"),
        Err(Error::Validation(details)) => {
            println!("Rejected locally: {} ({:?})", details.message, details.code)
        }
        Err(e) => println!("Other error: {}", e),
    }

    Ok(())
}
