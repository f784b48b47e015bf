//! Integration tests for the Google Calendar client against a mock server.
//!
//! Coverage:
//! - Token refresh happy path and access-token caching
//! - Rejected refresh token surfaces as an auth error
//! - Event listing, filtering, and mapping into meetings
//! - Transient 5xx on the events endpoint is retried

use std::time::Duration;

use chrono::{TimeZone, Utc};
use chrono_tz::America::New_York;
use nudge_core::MeetingSource;
use nudge_domain::{GoogleConfig, NudgeError};
use nudge_infra::http::HttpClient;
use nudge_infra::GoogleCalendarClient;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn google_config() -> GoogleConfig {
    GoogleConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        skip_all_day_events: true,
        skip_declined_events: true,
    }
}

fn client_for(server: &MockServer) -> GoogleCalendarClient {
    let http = HttpClient::builder()
        .timeout(Duration::from_secs(2))
        .base_backoff(Duration::from_millis(1))
        .build()
        .expect("http client");
    GoogleCalendarClient::new(http, google_config(), "primary", "refresh-tok", New_York, "alice")
        .with_endpoints(server.uri(), format!("{}/token", server.uri()))
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-123",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn authenticate_exchanges_refresh_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let client = client_for(&server);
    client.authenticate().await.expect("authenticate succeeds");
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_refresh_token_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.authenticate().await.expect_err("authenticate fails");
    assert!(matches!(err, NudgeError::Auth(_)), "got {err:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_upcoming_maps_and_filters_events() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "id": "evt-standup",
                    "summary": "Standup",
                    "status": "confirmed",
                    "start": {"dateTime": "2024-05-01T13:00:00Z"},
                    "end": {"dateTime": "2024-05-01T13:15:00Z"},
                    "htmlLink": "https://calendar.example/evt-standup"
                },
                {
                    "id": "evt-cancelled",
                    "summary": "Cancelled sync",
                    "status": "cancelled",
                    "start": {"dateTime": "2024-05-01T13:30:00Z"},
                    "end": {"dateTime": "2024-05-01T14:00:00Z"}
                },
                {
                    "id": "evt-offsite",
                    "summary": "Offsite",
                    "start": {"date": "2024-05-01"},
                    "end": {"date": "2024-05-02"}
                },
                {
                    "id": "evt-untitled",
                    "start": {"dateTime": "2024-05-01T13:05:00Z"},
                    "end": {"dateTime": "2024-05-01T13:35:00Z"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 55, 0).unwrap();
    let meetings = client.fetch_upcoming(now, 15).await.expect("fetch succeeds");

    assert_eq!(meetings.len(), 2);
    assert_eq!(meetings[0].event_id, "evt-standup");
    assert_eq!(meetings[0].title, "Standup");
    assert_eq!(meetings[0].minutes_until_start(now), 5);
    assert_eq!(
        meetings[0].html_link.as_deref(),
        Some("https://calendar.example/evt-standup")
    );
    assert_eq!(meetings[1].title, "(No title)");
}

#[tokio::test(flavor = "multi_thread")]
async fn access_token_is_cached_across_fetches() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": [] })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    client.fetch_upcoming(now, 15).await.expect("first fetch");
    client.fetch_upcoming(now, 15).await.expect("second fetch");
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_for_day_builds_digest_entries() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "id": "evt-1",
                    "summary": "Planning",
                    "start": {"dateTime": "2024-05-01T13:00:00Z"},
                    "end": {"dateTime": "2024-05-01T14:00:00Z"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let day = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let entries = client.fetch_for_day(day).await.expect("fetch succeeds");

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Planning");
    assert_eq!(entries[0].start_display, "9:00 AM");
    assert_eq!(entries[0].end_display, "10:00 AM");
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": [] })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let meetings = client.fetch_upcoming(now, 15).await.expect("retry succeeds");
    assert!(meetings.is_empty());
}
