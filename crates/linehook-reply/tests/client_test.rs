//! Integration tests for the reply client.
//!
//! Runs the client against a mock messaging API and checks request shape,
//! authentication, and error categorization.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use linehook_core::{OutboundMessage, ReplyError, ReplyRequest, ReplyToken, ReplyTransport};
use linehook_reply::{ClientConfig, LineReplyClient, REPLY_PATH};
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn client_for(server: &MockServer) -> LineReplyClient {
    let config = ClientConfig::new("test-token").with_base_url(server.uri());
    LineReplyClient::new(config).expect("Failed to create client")
}

fn echo_request(token: &str, text: &str) -> ReplyRequest {
    ReplyRequest::single(ReplyToken::new(token), OutboundMessage::text(text))
}

#[tokio::test]
async fn sends_reply_with_bearer_token_and_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(REPLY_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "replyToken": "R1",
            "messages": [{"type": "text", "text": "hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).reply(echo_request("R1", "hi")).await.expect("Reply should succeed");
}

#[tokio::test]
async fn sends_flex_messages_with_alt_text() {
    let server = MockServer::start().await;
    let contents = json!({"type": "bubble", "body": {"type": "box", "layout": "vertical", "contents": []}});

    Mock::given(method("POST"))
        .and(path(REPLY_PATH))
        .and(body_json(json!({
            "replyToken": "R2",
            "messages": [
                {"type": "text", "text": "Pick a time"},
                {"type": "flex", "altText": "Reservation", "contents": contents.clone()}
            ]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let request = ReplyRequest::new(ReplyToken::new("R2"), vec![
        OutboundMessage::text("Pick a time"),
        OutboundMessage::flex("Reservation", contents),
    ])
    .unwrap();

    client_for(&server).reply(request).await.expect("Reply should succeed");
}

#[tokio::test]
async fn client_error_is_rejected_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(REPLY_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"message":"Invalid reply token"}"#),
        )
        .mount(&server)
        .await;

    let error = client_for(&server).reply(echo_request("R1", "hi")).await.unwrap_err();

    match error {
        ReplyError::Rejected { status_code, body } => {
            assert_eq!(status_code, 400);
            assert!(body.contains("Invalid reply token"));
        },
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(REPLY_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let error = client_for(&server).reply(echo_request("R1", "hi")).await.unwrap_err();

    assert!(matches!(error, ReplyError::Rejected { status_code: 429, .. }));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn server_error_is_categorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(REPLY_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let error = client_for(&server).reply(echo_request("R1", "hi")).await.unwrap_err();

    assert!(matches!(error, ReplyError::Server { status_code: 503, .. }));
    assert!(error.is_retryable());
}

#[tokio::test]
async fn long_error_bodies_are_truncated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(REPLY_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("x".repeat(4096)))
        .mount(&server)
        .await;

    let error = client_for(&server).reply(echo_request("R1", "hi")).await.unwrap_err();

    let ReplyError::Rejected { body, .. } = error else {
        panic!("expected rejection");
    };
    assert!(body.len() < 4096);
    assert!(body.ends_with("(truncated)"));
}

#[tokio::test]
async fn slow_api_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(REPLY_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = ClientConfig::new("test-token")
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(100));
    let client = LineReplyClient::new(config).unwrap();

    let error = client.reply(echo_request("R1", "hi")).await.unwrap_err();

    assert!(matches!(error, ReplyError::Timeout { .. }));
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    let config = ClientConfig::new("test-token").with_base_url("http://127.0.0.1:1");
    let client = LineReplyClient::new(config).unwrap();

    let error = client.reply(echo_request("R1", "hi")).await.unwrap_err();

    assert!(matches!(error, ReplyError::Network { .. }));
}
