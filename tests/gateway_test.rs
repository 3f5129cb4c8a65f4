//! Integration tests for the gateway client against mock OAuth and chat
//! endpoints.
//!
//! Covers:
//! - Successful chat dispatch with bearer auth
//! - Error taxonomy on API failures (401, 429, 503)
//! - Deadline enforcement
//! - Probe payload and `test_connection`
//! - Demo mode making no requests

mod common;

use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatgate::cli::chat::send_with_reauth;
use chatgate::core::gateway::{GatewayClient, PROBE_MAX_TOKENS, PROBE_PROMPT};
use chatgate::core::http::RequestOutcome;
use chatgate::core::models::ChatMessage;
use chatgate::error::{DiagnosticCode, GatewayError};
use chatgate::storage::GatewayConfig;
use chatgate::test_utils::{chat_body, error_body, mock_server_config, oauth_body};

use common::logger::TestLogger;

async fn mount_oauth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(oauth_body("T1", 1800)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn send_chat_uses_bearer_token_and_config() {
    let log = TestLogger::new("send_chat_uses_bearer_token_and_config");
    log.phase("setup");

    let server = MockServer::start().await;
    mount_oauth(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("Authorization", "Bearer T1"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "stream": false,
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "hello" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("hi there")))
        .expect(1)
        .mount(&server)
        .await;

    log.phase("execute");
    let client = GatewayClient::new(mock_server_config(&server.uri())).expect("client");
    let messages = [ChatMessage::system("be brief"), ChatMessage::user("hello")];
    let outcome = client.send_chat(&messages, false).await;

    log.phase("verify");
    let RequestOutcome::Success(completion) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(completion.first_content(), Some("hi there"));
    assert_eq!(completion.usage.map(|u| u.total_tokens), Some(12));
    log.finish_ok();
}

#[tokio::test]
async fn unauthorized_api_call_is_classified() {
    let log = TestLogger::new("unauthorized_api_call_is_classified");
    let server = MockServer::start().await;
    mount_oauth(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body("bad token")))
        .mount(&server)
        .await;

    let client = GatewayClient::new(mock_server_config(&server.uri())).expect("client");
    let outcome = client.send_chat(&[ChatMessage::user("hello")], false).await;

    let err = outcome.failure().expect("401 is a failure");
    assert_eq!(err.code, DiagnosticCode::Unauthorized);
    assert_eq!(err.raw_message, "API 401: bad token");
    assert!(err.is_immediately_actionable);
    assert_eq!(err.remediation().title, "Authorization failed");
    log.finish_ok();
}

async fn mount_oauth_expecting(server: &MockServer, exchanges: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(oauth_body("T1", 1800)))
        .expect(exchanges)
        .mount(server)
        .await;
}

async fn mount_chat_401(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body("bad token")))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn reauth_clears_token_and_retries_once() {
    let log = TestLogger::new("reauth_clears_token_and_retries_once");
    log.phase("setup");
    let server = MockServer::start().await;
    mount_oauth_expecting(&server, 2).await;
    mount_chat_401(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    log.phase("execute");
    let client = GatewayClient::new(mock_server_config(&server.uri())).expect("client");
    let (sequence, completion, retried) =
        send_with_reauth(&client, &[ChatMessage::user("hello")], true)
            .await
            .expect("second attempt succeeds");

    log.phase("verify");
    assert!(retried);
    assert_eq!(sequence.get(), 2);
    assert_eq!(completion.first_content(), Some("ok"));
    log.finish_ok();
}

#[tokio::test]
async fn reauth_disabled_surfaces_first_401() {
    let log = TestLogger::new("reauth_disabled_surfaces_first_401");
    let server = MockServer::start().await;
    mount_oauth_expecting(&server, 1).await;
    mount_chat_401(&server, 1).await;

    let client = GatewayClient::new(mock_server_config(&server.uri())).expect("client");
    let err = send_with_reauth(&client, &[ChatMessage::user("hello")], false)
        .await
        .expect_err("401 without reauth");

    let GatewayError::Request(classified) = err else {
        panic!("expected a request failure, got {err:?}");
    };
    assert_eq!(classified.code, DiagnosticCode::Unauthorized);
    assert!(client.tokens().peek().is_some(), "token kept when not retrying");
    log.finish_ok();
}

#[tokio::test]
async fn reauth_gives_up_after_second_401() {
    let log = TestLogger::new("reauth_gives_up_after_second_401");
    let server = MockServer::start().await;
    mount_oauth_expecting(&server, 2).await;
    mount_chat_401(&server, 2).await;

    let client = GatewayClient::new(mock_server_config(&server.uri())).expect("client");
    let err = send_with_reauth(&client, &[ChatMessage::user("hello")], true)
        .await
        .expect_err("persistent 401");

    let GatewayError::Request(classified) = err else {
        panic!("expected a request failure, got {err:?}");
    };
    assert_eq!(classified.code, DiagnosticCode::Unauthorized);
    assert_eq!(classified.raw_message, "API 401: bad token");
    log.finish_ok();
}

#[tokio::test]
async fn api_failures_map_onto_taxonomy() {
    let log = TestLogger::new("api_failures_map_onto_taxonomy");

    for (status, expected) in [
        (400, DiagnosticCode::BadRequest),
        (403, DiagnosticCode::Forbidden),
        (429, DiagnosticCode::RateLimited),
        (500, DiagnosticCode::ServerError),
        (503, DiagnosticCode::UnknownHttp(503)),
    ] {
        let server = MockServer::start().await;
        mount_oauth(&server).await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;

        let client = GatewayClient::new(mock_server_config(&server.uri())).expect("client");
        let outcome = client.send_chat(&[ChatMessage::user("x")], false).await;
        let err = outcome.failure().expect("failure");
        log.info(&format!("status {status} -> {}", err.code));
        assert_eq!(err.code, expected, "status {status}");
        assert_eq!(err.raw_message, format!("API {status}: nope"));
    }
    log.finish_ok();
}

#[tokio::test]
async fn oauth_failure_skips_the_chat_request() {
    let log = TestLogger::new("oauth_failure_skips_the_chat_request");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth"))
        .respond_with(ResponseTemplate::new(403).set_body_json(error_body("scope denied")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let client = GatewayClient::new(mock_server_config(&server.uri())).expect("client");
    let outcome = client.send_chat(&[ChatMessage::user("x")], false).await;

    let err = outcome.failure().expect("OAuth failure propagates");
    assert_eq!(err.code, DiagnosticCode::Forbidden);
    assert_eq!(err.raw_message, "OAuth 403: scope denied");
    log.finish_ok();
}

#[tokio::test]
async fn slow_api_hits_the_deadline() {
    let log = TestLogger::new("slow_api_hits_the_deadline");
    let server = MockServer::start().await;
    mount_oauth(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_body("late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = GatewayConfig {
        chat_timeout: Duration::from_secs(1),
        ..mock_server_config(&server.uri())
    };
    let client = GatewayClient::new(config).expect("client");

    let start = Instant::now();
    let outcome = client.send_chat(&[ChatMessage::user("x")], false).await;
    let elapsed = start.elapsed();

    let err = outcome.failure().expect("deadline failure");
    assert_eq!(err.code, DiagnosticCode::Timeout);
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    log.finish_ok();
}

#[tokio::test]
async fn probe_sends_single_ping_message() {
    let log = TestLogger::new("probe_sends_single_ping_message");
    let server = MockServer::start().await;
    mount_oauth(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_partial_json(json!({
            "max_tokens": PROBE_MAX_TOKENS,
            "messages": [{ "role": "user", "content": PROBE_PROMPT }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("pong")))
        .expect(1)
        .mount(&server)
        .await;

    let client = GatewayClient::new(mock_server_config(&server.uri())).expect("client");
    assert!(client.test_connection().await);
    log.finish_ok();
}

#[tokio::test]
async fn probe_without_choices_is_not_connected() {
    let log = TestLogger::new("probe_without_choices_is_not_connected");
    let server = MockServer::start().await;
    mount_oauth(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = GatewayClient::new(mock_server_config(&server.uri())).expect("client");
    let outcome = client.probe_connection().await;
    assert_eq!(
        outcome.failure().map(|e| e.code),
        Some(DiagnosticCode::Unknown)
    );
    assert!(!client.test_connection().await);
    log.finish_ok();
}

#[tokio::test]
async fn demo_mode_makes_no_requests() {
    let log = TestLogger::new("demo_mode_makes_no_requests");
    let server = MockServer::start().await;

    let config = GatewayConfig {
        use_mock_data: true,
        client_id: String::new(),
        ..mock_server_config(&server.uri())
    };
    let client = GatewayClient::new(config).expect("client id not needed in demo mode");

    let outcome = client.send_chat(&[ChatMessage::user("hello")], false).await;
    let RequestOutcome::Success(completion) = outcome else {
        panic!("demo mode always succeeds");
    };
    assert!(completion.first_content().is_some_and(|c| !c.is_empty()));
    assert!(client.test_connection().await);

    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty(), "demo mode sent {} requests", received.len());
    log.finish_ok();
}

#[tokio::test]
async fn unreachable_host_is_network_failure() {
    let log = TestLogger::new("unreachable_host_is_network_failure");
    let config = mock_server_config("http://127.0.0.1:1");
    let client = GatewayClient::new(config).expect("client");

    let outcome = client.send_chat(&[ChatMessage::user("x")], false).await;
    let err = outcome.failure().expect("connection refused");
    assert_eq!(err.code, DiagnosticCode::NetworkUnreachable);
    log.finish_ok();
}
