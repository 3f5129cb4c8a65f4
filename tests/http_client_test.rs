//! Integration tests for the HTTP transport with a mock server.
//!
//! Tests transport behavior against wiremock endpoints to verify:
//! - Success responses carry status and body
//! - Non-2xx responses become classified failures
//! - Deadlines and cancellation end the call early

mod common;

use std::time::{Duration, Instant};

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatgate::core::http::{CancelHandle, HttpRequest, HttpTransport, RequestOutcome};
use chatgate::error::DiagnosticCode;

use common::logger::TestLogger;

#[tokio::test]
async fn execute_success_returns_body() {
    let log = TestLogger::new("execute_success_returns_body");
    log.phase("setup");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("X-Test", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .mount(&server)
        .await;

    log.phase("execute");
    let transport = HttpTransport::new().expect("transport");
    let url = format!("{}/echo", server.uri());
    log.http_request("POST", &url);
    let request = HttpRequest::post(url)
        .header("X-Test", "1")
        .json(serde_json::json!({"q": 1}))
        .deadline(Duration::from_secs(2));
    let outcome = transport.execute(request).await;

    log.phase("verify");
    let RequestOutcome::Success(response) = outcome else {
        panic!("expected success");
    };
    assert_eq!(response.status, 200);
    let body: serde_json::Value = response.json().expect("valid json");
    assert_eq!(body["ok"], true);
    log.finish_ok();
}

#[tokio::test]
async fn non_2xx_is_classified_with_label() {
    let log = TestLogger::new("non_2xx_is_classified_with_label");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/limited"))
        .respond_with(
            ResponseTemplate::new(429).set_body_string(r#"{"message":"slow down"}"#),
        )
        .mount(&server)
        .await;

    let transport = HttpTransport::new().expect("transport");
    let request = HttpRequest::post(format!("{}/limited", server.uri()))
        .deadline(Duration::from_secs(2))
        .label("API");
    let outcome = transport.execute(request).await;

    let err = outcome.failure().expect("429 is a failure");
    assert_eq!(err.code, DiagnosticCode::RateLimited);
    assert_eq!(err.raw_message, "API 429: slow down");
    assert!(err.server_responded());
    log.finish_ok();
}

#[tokio::test]
async fn invalid_json_body_is_unknown() {
    let log = TestLogger::new("invalid_json_body_is_unknown");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().expect("transport");
    let outcome = transport
        .execute(HttpRequest::post(format!("{}/garbage", server.uri())))
        .await;
    let RequestOutcome::Success(response) = outcome else {
        panic!("200 is a transport success");
    };
    let err = response
        .json::<serde_json::Value>()
        .expect_err("not json");
    assert_eq!(err.code, DiagnosticCode::Unknown);
    log.finish_ok();
}

#[tokio::test]
async fn deadline_cuts_slow_response() {
    let log = TestLogger::new("deadline_cuts_slow_response");
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().expect("transport");
    let start = Instant::now();
    let outcome = transport
        .execute(HttpRequest::head(server.uri()).deadline(Duration::from_millis(300)))
        .await;

    let err = outcome.failure().expect("deadline exceeded");
    assert_eq!(err.code, DiagnosticCode::Timeout);
    assert!(start.elapsed() < Duration::from_secs(2));
    log.finish_ok();
}

#[tokio::test]
async fn cancel_aborts_in_flight_call() {
    let log = TestLogger::new("cancel_aborts_in_flight_call");
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().expect("transport");
    let (handle, registration) = CancelHandle::new();
    let call = transport.execute_cancellable(
        HttpRequest::head(server.uri()).deadline(Duration::from_secs(10)),
        registration,
    );

    let start = Instant::now();
    let canceller = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    };
    let (outcome, ()) = tokio::join!(call, canceller);

    let err = outcome.failure().expect("cancelled");
    assert_eq!(err.code, DiagnosticCode::Unknown);
    assert!(start.elapsed() < Duration::from_secs(2));
    log.finish_ok();
}
