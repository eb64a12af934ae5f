//! Integration tests using wiremock to simulate the VerifyKit API.

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use verifykit::{Client, Error, Reachable, ValidateOptions};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = "vk_test_12345678901234567890";

fn client_for(server: &MockServer, max_retries: u32) -> Client {
    Client::builder()
        .api_key(TEST_KEY)
        .base_url(server.uri())
        .max_retries(max_retries)
        .retry_base_delay(Duration::from_millis(10))
        .build()
        .unwrap()
}

fn validation_json(email: &str) -> serde_json::Value {
    json!({
        "email": email,
        "valid": true,
        "reachable": "valid",
        "syntax": {"valid": true, "username": "user", "domain": "example.com"},
        "mx": {"valid": true, "records": ["mx1.example.com"]},
        "smtp": {"valid": true, "state": "deliverable"},
        "disposable": false,
        "role_based": false,
        "free_email": false,
        "score": 0.92,
        "quality_grade": "excellent"
    })
}

/// Mounts a catch-all mock that must never be hit.
async fn expect_no_requests(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_successful_validate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .and(header("authorization", format!("Bearer {}", TEST_KEY).as_str()))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"email": "user@example.com"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(validation_json("user@example.com"))
                .insert_header("x-request-id", "req_123")
                .insert_header("x-cache", "MISS")
                .insert_header("x-response-time", "87")
                .insert_header("x-ratelimit-limit", "60")
                .insert_header("x-ratelimit-remaining", "59")
                .insert_header("x-ratelimit-reset", "1700000000"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let response = client.validate("user@example.com").await.unwrap();

    assert_eq!(response.email, "user@example.com");
    assert!(response.valid);
    assert_eq!(response.reachable, Reachable::Valid);
    assert_eq!(response.syntax.domain, "example.com");
    assert_eq!(response.smtp.as_ref().map(|s| s.state.as_str()), Some("deliverable"));
    assert_eq!(response.quality_grade.as_deref(), Some("excellent"));
    assert_eq!(response.attempts, 1);
    assert!(!response.was_retried());

    assert_eq!(response.metadata.request_id.as_deref(), Some("req_123"));
    assert_eq!(response.metadata.cache.as_deref(), Some("MISS"));
    assert_eq!(response.metadata.response_time, Some(87));
    let rate_limit = response.metadata.rate_limit.unwrap();
    assert_eq!(rate_limit.limit, 60);
    assert_eq!(rate_limit.remaining, 59);

    assert_eq!(client.last_metadata(), Some(response.metadata.clone()));
}

#[tokio::test]
async fn test_sends_user_agent_and_custom_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/usage"))
        .and(header(
            "user-agent",
            concat!("verifykit-rust-sdk/", env!("CARGO_PKG_VERSION")),
        ))
        .and(header("x-custom-header", "custom-value"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"current": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_key(TEST_KEY)
        .base_url(mock_server.uri())
        .header("X-Custom-Header", "custom-value")
        .build()
        .unwrap();

    client.usage().await.unwrap();
}

#[tokio::test]
async fn test_validate_options_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .and(body_json(json!({
            "email": "user@example.com",
            "skip_smtp": true,
            "webhook": "https://example.com/hook"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "user@example.com",
            "valid": true,
            "reachable": "unknown"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let options = ValidateOptions {
        skip_smtp: true,
        webhook: Some("https://example.com/hook".to_string()),
    };
    let response = client
        .validate_with("user@example.com", &options)
        .await
        .unwrap();

    assert!(response.smtp.is_none());
    assert_eq!(response.reachable, Reachable::Unknown);
}

#[tokio::test]
async fn test_local_validation_sends_nothing() {
    let mock_server = MockServer::start().await;
    expect_no_requests(&mock_server).await;

    let client = client_for(&mock_server, 3);

    match client.validate("").await {
        Err(Error::Validation(details)) => {
            assert_eq!(details.code.as_deref(), Some("INVALID_EMAIL"));
            assert!(details.message.contains("required"));
        }
        other => panic!("Expected Validation error, got {:?}", other),
    }

    match client.validate("not-an-email").await {
        Err(Error::Validation(details)) => {
            assert_eq!(details.message, "Invalid email format");
            assert_eq!(details.status, None);
        }
        other => panic!("Expected Validation error, got {:?}", other),
    }

    let options = ValidateOptions {
        webhook: Some("not-a-url".to_string()),
        ..Default::default()
    };
    let err = client
        .validate_with("user@example.com", &options)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("INVALID_WEBHOOK_URL"));

    assert!(client.last_metadata().is_none());
}

#[tokio::test]
async fn test_bulk_local_validation() {
    let mock_server = MockServer::start().await;
    expect_no_requests(&mock_server).await;

    let client = client_for(&mock_server, 3);

    let empty: Vec<String> = Vec::new();
    let err = client.validate_bulk(&empty).await.unwrap_err();
    assert_eq!(err.code(), Some("EMPTY_EMAILS"));

    let too_many = vec!["test@example.com"; 1001];
    let err = client.validate_bulk(&too_many).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.message(), "Maximum 1000 emails per request");

    let err = client
        .validate_bulk(&["valid@example.com", "invalid-email"])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("INVALID_EMAIL_FORMAT"));
    assert!(err.message().contains("invalid-email"));

    let options = ValidateOptions {
        webhook: Some("nope".to_string()),
        ..Default::default()
    };
    let err = client
        .validate_bulk_with(&["valid@example.com"], &options)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("INVALID_WEBHOOK_URL"));
}

#[tokio::test]
async fn test_bulk_deduplicates_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify/bulk"))
        .and(body_json(json!({"emails": ["a@x.com", "b@x.com"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [validation_json("a@x.com"), validation_json("b@x.com")],
            "summary": {
                "total": 2,
                "valid": 2,
                "invalid": 0,
                "risky": 0,
                "processing_time_ms": 512,
                "duplicates_removed": 0
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let response = client
        .validate_bulk(&["a@x.com", "a@x.com", "b@x.com"])
        .await
        .unwrap();

    let emails: Vec<&str> = response.results.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
    assert_eq!(response.summary.total, 2);
    assert_eq!(response.summary.processing_time_ms, 512);
    // Only the server's own count is reported.
    assert_eq!(response.summary.duplicates_removed, 0);
}

#[tokio::test]
async fn test_usage() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/usage"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "current": 250,
                    "limit": 1000,
                    "remaining": 750,
                    "percentage": 25.0,
                    "period_start": "2024-01-01T00:00:00Z",
                    "period_end": "2024-01-31T23:59:59Z"
                }))
                .insert_header("x-usage-current", "250")
                .insert_header("x-usage-limit", "1000"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let usage = client.usage().await.unwrap();

    assert_eq!(usage.current, 250);
    assert_eq!(usage.limit, 1000);
    assert_eq!(usage.remaining, 750);
    assert_eq!(usage.period_start, "2024-01-01T00:00:00Z");
    let snapshot = usage.metadata.usage.unwrap();
    assert_eq!((snapshot.current, snapshot.limit), (250, 1000));
}

#[tokio::test]
async fn test_retry_on_5xx_with_exponential_backoff() {
    let mock_server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::<Instant>::new()));
    let arrivals_clone = arrivals.clone();

    // First three requests fail with 503, fourth succeeds
    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(move |_req: &wiremock::Request| {
            let mut seen = arrivals_clone.lock().unwrap();
            seen.push(Instant::now());
            if seen.len() <= 3 {
                ResponseTemplate::new(503)
                    .set_body_json(json!({"error": "Service Unavailable", "message": "try later"}))
            } else {
                ResponseTemplate::new(200).set_body_json(validation_json("user@example.com"))
            }
        })
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_key(TEST_KEY)
        .base_url(mock_server.uri())
        .max_retries(3)
        .retry_base_delay(Duration::from_millis(50))
        .build()
        .unwrap();

    let response = client.validate("user@example.com").await.unwrap();

    assert_eq!(response.attempts, 4);
    assert!(response.was_retried());
    assert!(response.valid);

    let arrivals = arrivals.lock().unwrap();
    assert_eq!(arrivals.len(), 4);
    let gaps: Vec<Duration> = arrivals.windows(2).map(|w| w[1] - w[0]).collect();

    // Each wait doubles: 50ms, 100ms, 200ms
    for (gap, expected_ms) in gaps.iter().zip([50u64, 100, 200]) {
        assert!(
            *gap >= Duration::from_millis(expected_ms),
            "expected a gap of at least {}ms, got {:?} (all gaps: {:?})",
            expected_ms,
            gap,
            gaps
        );
    }
    assert!(gaps[2] > gaps[0], "backoff did not grow: {:?}", gaps);
}

#[tokio::test]
async fn test_max_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Internal Server Error",
            "message": "Something broke",
            "requestId": "req_500"
        })))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 2);
    let err = client.validate("user@example.com").await.unwrap_err();

    match &err {
        Error::Server(details) => {
            assert_eq!(details.status, Some(500));
            assert_eq!(details.message, "Something broke");
        }
        other => panic!("Expected Server error, got {:?}", other),
    }
    assert_eq!(err.request_id(), Some("req_500"));
}

#[tokio::test]
async fn test_no_retries_configured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let err = client.validate("user@example.com").await.unwrap_err();

    assert!(matches!(err, Error::Server(_)));
    assert_eq!(err.message(), "An unknown error occurred");
}

#[tokio::test]
async fn test_rate_limit_honors_retry_after() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count == 0 {
                ResponseTemplate::new(429)
                    .set_body_json(json!({"error": "Too Many Requests", "message": "Slow down"}))
                    .insert_header("retry-after", "1")
            } else {
                ResponseTemplate::new(200).set_body_json(validation_json("user@example.com"))
            }
        })
        .mount(&mock_server)
        .await;

    // A 10ms base delay would retry almost immediately without the hint.
    let client = client_for(&mock_server, 3);

    let start = Instant::now();
    let response = client.validate("user@example.com").await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
    assert_eq!(response.attempts, 2);
    assert!(
        elapsed >= Duration::from_secs(1),
        "expected the Retry-After delay, got {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_rate_limit_surfaces_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"error": "Too Many Requests", "message": "Slow down"}))
                .insert_header("retry-after", "0")
                .insert_header("x-ratelimit-limit", "60")
                .insert_header("x-ratelimit-remaining", "0"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);
    let err = client.validate("user@example.com").await.unwrap_err();

    match err {
        Error::RateLimit { error, retry_after } => {
            assert_eq!(retry_after, Some(0));
            assert_eq!(error.message, "Slow down");
            assert_eq!(error.status, Some(429));
        }
        other => panic!("Expected RateLimit error, got {:?}", other),
    }

    let metadata = client.last_metadata().unwrap();
    assert!(metadata.rate_limit.unwrap().is_exhausted());
}

#[tokio::test]
async fn test_quota_exceeded_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({
                    "error": "Monthly Limit Exceeded",
                    "message": "You have used all 1000 validations this month"
                }))
                .insert_header("retry-after", "1")
                .insert_header("x-request-id", "req_quota"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let err = client.validate("user@example.com").await.unwrap_err();

    match &err {
        Error::QuotaExceeded(details) => {
            assert_eq!(
                details.message,
                "You have used all 1000 validations this month"
            );
            assert_eq!(details.code.as_deref(), Some("Monthly Limit Exceeded"));
        }
        other => panic!("Expected QuotaExceeded error, got {:?}", other),
    }
    assert!(!err.is_retryable());

    // Error responses still update the metadata slot.
    let metadata = client.last_metadata().unwrap();
    assert_eq!(metadata.request_id.as_deref(), Some("req_quota"));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Unauthorized",
            "message": "Invalid API key",
            "requestId": "req_401",
            "documentation": "https://docs.verifykit.io/errors/unauthorized"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/user/usage"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "Not Found",
            "message": "No such route"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/verify/bulk"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": "Unprocessable Entity",
            "message": "emails must be unique"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);

    let err = client.validate("user@example.com").await.unwrap_err();
    assert!(matches!(err, Error::Authentication(_)));
    assert_eq!(err.request_id(), Some("req_401"));
    assert_eq!(
        err.documentation(),
        Some("https://docs.verifykit.io/errors/unauthorized")
    );

    let err = client.usage().await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = client.validate_bulk(&["a@x.com"]).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.status(), Some(422));
}

#[tokio::test]
async fn test_invalid_json_success_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/user/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);

    let err = client.validate("user@example.com").await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
    assert_eq!(err.message(), "Invalid JSON response");

    let err = client.usage().await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
}

#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/verify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(validation_json("user@example.com"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_key(TEST_KEY)
        .base_url(mock_server.uri())
        .timeout(Duration::from_millis(200))
        .max_retries(0)
        .build()
        .unwrap();

    let err = client.validate("user@example.com").await.unwrap_err();
    match err {
        Error::Timeout { timeout, .. } => assert_eq!(timeout, Duration::from_millis(200)),
        other => panic!("Expected Timeout error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused() {
    let client = Client::builder()
        .api_key(TEST_KEY)
        .base_url("http://127.0.0.1:1")
        .max_retries(1)
        .retry_base_delay(Duration::from_millis(10))
        .build()
        .unwrap();

    let err = client.validate("user@example.com").await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }), "got {:?}", err);
    assert!(client.last_metadata().is_none());
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/proxy/v1/user/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"limit": 10})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .api_key(TEST_KEY)
        .base_url(format!("{}/proxy", mock_server.uri()))
        .build()
        .unwrap();

    let usage = client.usage().await.unwrap();
    assert_eq!(usage.limit, 10);
}

#[tokio::test]
async fn test_last_metadata_tracks_latest_request() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    Mock::given(method("GET"))
        .and(path("/v1/user/usage"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200)
                .set_body_json(json!({"current": count}))
                .insert_header("x-request-id", format!("req_{}", count).as_str())
        })
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    assert!(client.last_metadata().is_none());

    client.usage().await.unwrap();
    assert_eq!(
        client.last_metadata().unwrap().request_id.as_deref(),
        Some("req_0")
    );

    client.usage().await.unwrap();
    assert_eq!(
        client.last_metadata().unwrap().request_id.as_deref(),
        Some("req_1")
    );
}

#[test]
fn test_configuration_errors() {
    for key in ["", "invalid_key", "pk_live_123"] {
        let err = Client::builder().api_key(key).build().err().unwrap();
        assert!(matches!(err, Error::Configuration(_)), "key {:?}", key);
    }

    for key in ["vk_live_123", "vk_test_123"] {
        assert!(Client::builder().api_key(key).build().is_ok());
    }

    let err = Client::builder()
        .api_key(TEST_KEY)
        .base_url("not-a-url")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, Error::Configuration(_)));

    let err = Client::builder()
        .api_key(TEST_KEY)
        .timeout(Duration::ZERO)
        .build()
        .err()
        .unwrap();
    assert_eq!(err.message(), "Timeout must be greater than 0");

    assert!(Client::builder()
        .api_key(TEST_KEY)
        .max_retries(0)
        .debug(true)
        .build()
        .is_ok());
}
