//! Integration tests for the Slack client against a mock server.
//!
//! Coverage:
//! - Reminder delivery opens a DM channel and posts to it
//! - The DM channel is cached after the first message
//! - `ok: false` API responses surface as notify errors

use std::time::Duration;

use nudge_core::{Notifier, ReminderNotice};
use nudge_domain::NudgeError;
use nudge_infra::http::HttpClient;
use nudge_infra::SlackClient;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> SlackClient {
    let http = HttpClient::builder()
        .timeout(Duration::from_secs(2))
        .base_backoff(Duration::from_millis(1))
        .build()
        .expect("http client");
    SlackClient::new(http, "xoxb-test").with_api_base(server.uri())
}

fn notice() -> ReminderNotice {
    ReminderNotice {
        title: "Standup".to_string(),
        minutes_until_start: 5,
        ping_ordinal: 1,
        confirmation_phrase: "ok".to_string(),
    }
}

async fn mount_open(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/conversations.open"))
        .and(body_string_contains("U123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "channel": { "id": "D999" }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn reminder_opens_dm_and_posts() {
    let server = MockServer::start().await;
    mount_open(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(body_string_contains("D999"))
        .and(body_string_contains("Meeting Reminder"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.send_reminder("U123", &notice()).await.expect("reminder sent");
}

#[tokio::test(flavor = "multi_thread")]
async fn dm_channel_is_cached_after_first_message() {
    let server = MockServer::start().await;
    mount_open(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.send_note("U123", "first").await.expect("first note");
    client.send_note("U123", "second").await.expect("second note");
}

#[tokio::test(flavor = "multi_thread")]
async fn api_level_rejection_is_a_notify_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/conversations.open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": false,
            "error": "user_not_found"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.send_note("U123", "hi").await.expect_err("send fails");
    match err {
        NudgeError::Notify(msg) => assert!(msg.contains("user_not_found"), "got {msg}"),
        other => panic!("expected notify error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn digest_renders_entries_into_one_message() {
    let server = MockServer::start().await;
    mount_open(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(body_string_contains("No meetings scheduled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .send_digest("U123", "Today's meetings (Wednesday, May 1)", &[])
        .await
        .expect("digest sent");
}
