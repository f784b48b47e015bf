//! Google Calendar adapter backing the [`MeetingSource`] port.
//!
//! Each user gets their own client instance holding their refresh token.
//! Access tokens are cached until shortly before expiry and refreshed
//! lazily via the OAuth token endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::Method;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use nudge_core::MeetingSource;
use nudge_domain::constants::UNTITLED_MEETING;
use nudge_domain::{DigestEntry, GoogleConfig, Meeting, NudgeError, Result};

use crate::errors::InfraError;
use crate::http::HttpClient;

use super::types::{GoogleCalendarEvent, GoogleEventsResponse, GoogleTokenResponse};

const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh the access token this many seconds before it actually expires.
const TOKEN_EXPIRY_MARGIN_SECONDS: i64 = 60;

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

pub struct GoogleCalendarClient {
    http: HttpClient,
    api_base: String,
    token_url: String,
    config: GoogleConfig,
    calendar_id: String,
    refresh_token: String,
    tz: Tz,
    user_label: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleCalendarClient {
    pub fn new(
        http: HttpClient,
        config: GoogleConfig,
        calendar_id: impl Into<String>,
        refresh_token: impl Into<String>,
        tz: Tz,
        user_label: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            config,
            calendar_id: calendar_id.into(),
            refresh_token: refresh_token.into(),
            tz,
            user_label: user_label.into(),
            token: Mutex::new(None),
        }
    }

    /// Point the client at alternate endpoints. Used by tests against a
    /// local mock server.
    pub fn with_endpoints(mut self, api_base: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.token_url = token_url.into();
        self
    }

    /// Eagerly exchange the refresh token so bad credentials surface at
    /// startup instead of on the first poll.
    #[instrument(skip(self), fields(user = %self.user_label))]
    pub async fn authenticate(&self) -> Result<()> {
        self.access_token().await?;
        debug!("google credentials verified");
        Ok(())
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if Utc::now() < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.refresh_access_token().await?;
        let access = token.access_token.clone();
        *guard = Some(token);
        Ok(access)
    }

    async fn refresh_access_token(&self) -> Result<CachedToken> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .send(
                self.http
                    .request(Method::POST, &self.token_url)
                    .form(&params),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(user = %self.user_label, %status, "google token refresh rejected");
            return Err(NudgeError::Auth(format!(
                "token refresh failed with {status}: {body}"
            )));
        }

        let token: GoogleTokenResponse = response.json().await.map_err(InfraError::from)?;
        let expires_at =
            Utc::now() + Duration::seconds((token.expires_in - TOKEN_EXPIRY_MARGIN_SECONDS).max(0));
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at,
        })
    }

    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<GoogleCalendarEvent>> {
        let access_token = self.access_token().await?;
        let url = format!("{}/calendars/{}/events", self.api_base, self.calendar_id);

        let response = self
            .http
            .send(
                self.http
                    .request(Method::GET, &url)
                    .bearer_auth(access_token)
                    .query(&[
                        ("timeMin", time_min.to_rfc3339().as_str()),
                        ("timeMax", time_max.to_rfc3339().as_str()),
                        ("singleEvents", "true"),
                        ("orderBy", "startTime"),
                    ]),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NudgeError::Calendar(format!(
                "event list failed with {status}: {body}"
            )));
        }

        let events: GoogleEventsResponse = response.json().await.map_err(InfraError::from)?;
        Ok(events.items)
    }

    fn keep_event(&self, event: &GoogleCalendarEvent) -> bool {
        if event.is_cancelled() {
            return false;
        }
        if self.config.skip_all_day_events && event.is_all_day() {
            return false;
        }
        if self.config.skip_declined_events && event.is_declined() {
            return false;
        }
        true
    }

    fn event_to_meeting(&self, event: GoogleCalendarEvent) -> Result<Meeting> {
        let all_day = event.is_all_day();
        let declined = event.is_declined();
        let start = self.parse_event_time(&event.start.date_time, &event.start.date)?;
        let end = self.parse_event_time(&event.end.date_time, &event.end.date)?;
        Ok(Meeting {
            event_id: event.id,
            title: event
                .summary
                .unwrap_or_else(|| UNTITLED_MEETING.to_string()),
            start_time: start,
            end_time: end,
            is_all_day: all_day,
            is_declined: declined,
            html_link: event.html_link,
        })
    }

    fn parse_event_time(
        &self,
        date_time: &Option<String>,
        date: &Option<String>,
    ) -> Result<DateTime<Utc>> {
        if let Some(stamp) = date_time {
            let parsed = DateTime::parse_from_rfc3339(stamp).map_err(|e| {
                NudgeError::Calendar(format!("unparsable event timestamp {stamp:?}: {e}"))
            })?;
            return Ok(parsed.with_timezone(&Utc));
        }
        if let Some(day) = date {
            let parsed = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
                NudgeError::Calendar(format!("unparsable event date {day:?}: {e}"))
            })?;
            return Ok(self.local_midnight(parsed)?);
        }
        Err(NudgeError::Calendar(
            "event carries neither dateTime nor date".to_string(),
        ))
    }

    fn local_midnight(&self, date: NaiveDate) -> Result<DateTime<Utc>> {
        let midnight = date.and_time(NaiveTime::MIN);
        self.tz
            .from_local_datetime(&midnight)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                NudgeError::Calendar(format!("no local midnight for {date} in {}", self.tz))
            })
    }

    fn event_to_digest_entry(&self, event: &GoogleCalendarEvent) -> Result<DigestEntry> {
        if event.is_all_day() {
            return Ok(DigestEntry {
                title: event
                    .summary
                    .clone()
                    .unwrap_or_else(|| UNTITLED_MEETING.to_string()),
                start_display: "All day".to_string(),
                end_display: String::new(),
                is_all_day: true,
            });
        }

        let start = self.parse_event_time(&event.start.date_time, &event.start.date)?;
        let end = self.parse_event_time(&event.end.date_time, &event.end.date)?;
        Ok(DigestEntry {
            title: event
                .summary
                .clone()
                .unwrap_or_else(|| UNTITLED_MEETING.to_string()),
            start_display: format_local_time(start, self.tz),
            end_display: format_local_time(end, self.tz),
            is_all_day: false,
        })
    }
}

fn format_local_time(stamp: DateTime<Utc>, tz: Tz) -> String {
    stamp.with_timezone(&tz).format("%-I:%M %p").to_string()
}

#[async_trait]
impl MeetingSource for GoogleCalendarClient {
    #[instrument(skip(self), fields(user = %self.user_label))]
    async fn fetch_upcoming(
        &self,
        now: DateTime<Utc>,
        lookahead_minutes: i64,
    ) -> Result<Vec<Meeting>> {
        let time_max = now + Duration::minutes(lookahead_minutes);
        let events = self.list_events(now, time_max).await?;
        let mut meetings = Vec::with_capacity(events.len());
        for event in events {
            if !self.keep_event(&event) {
                continue;
            }
            meetings.push(self.event_to_meeting(event)?);
        }
        debug!(count = meetings.len(), "fetched upcoming meetings");
        Ok(meetings)
    }

    #[instrument(skip(self), fields(user = %self.user_label))]
    async fn fetch_for_day(&self, local_date: NaiveDate) -> Result<Vec<DigestEntry>> {
        let day_start = self.local_midnight(local_date)?;
        let next_day = local_date
            .succ_opt()
            .ok_or_else(|| NudgeError::Calendar(format!("no day after {local_date}")))?;
        let day_end = self.local_midnight(next_day)?;

        let events = self.list_events(day_start, day_end).await?;
        let mut entries = Vec::with_capacity(events.len());
        for event in &events {
            if !self.keep_event(event) {
                continue;
            }
            entries.push(self.event_to_digest_entry(event)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    fn client() -> GoogleCalendarClient {
        GoogleCalendarClient::new(
            HttpClient::builder().build().unwrap(),
            GoogleConfig {
                client_id: "cid".to_string(),
                client_secret: "secret".to_string(),
                skip_all_day_events: true,
                skip_declined_events: true,
            },
            "primary",
            "refresh",
            New_York,
            "alice",
        )
    }

    fn timed_event(id: &str, summary: Option<&str>) -> GoogleCalendarEvent {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "summary": summary,
            "start": {"dateTime": "2024-05-01T13:00:00Z"},
            "end": {"dateTime": "2024-05-01T13:30:00Z"}
        }))
        .unwrap()
    }

    #[test]
    fn missing_summary_falls_back_to_placeholder() {
        let meeting = client().event_to_meeting(timed_event("e1", None)).unwrap();
        assert_eq!(meeting.title, "(No title)");
    }

    #[test]
    fn filters_cancelled_and_all_day() {
        let client = client();
        let cancelled: GoogleCalendarEvent = serde_json::from_value(serde_json::json!({
            "id": "e1",
            "status": "cancelled",
            "start": {"dateTime": "2024-05-01T13:00:00Z"},
            "end": {"dateTime": "2024-05-01T13:30:00Z"}
        }))
        .unwrap();
        let all_day: GoogleCalendarEvent = serde_json::from_value(serde_json::json!({
            "id": "e2",
            "summary": "Offsite",
            "start": {"date": "2024-05-01"},
            "end": {"date": "2024-05-02"}
        }))
        .unwrap();

        assert!(!client.keep_event(&cancelled));
        assert!(!client.keep_event(&all_day));
        assert!(client.keep_event(&timed_event("e3", Some("Standup"))));
    }

    #[test]
    fn all_day_kept_when_not_skipped() {
        let mut client = client();
        client.config.skip_all_day_events = false;
        let all_day: GoogleCalendarEvent = serde_json::from_value(serde_json::json!({
            "id": "e2",
            "summary": "Offsite",
            "start": {"date": "2024-05-01"},
            "end": {"date": "2024-05-02"}
        }))
        .unwrap();

        assert!(client.keep_event(&all_day));
        let entry = client.event_to_digest_entry(&all_day).unwrap();
        assert_eq!(entry.start_display, "All day");
        assert!(entry.is_all_day);
    }

    #[test]
    fn digest_entry_renders_local_times() {
        let event = timed_event("e1", Some("Standup"));
        let entry = client().event_to_digest_entry(&event).unwrap();
        // 13:00 UTC is 9:00 AM in New York during DST.
        assert_eq!(entry.start_display, "9:00 AM");
        assert_eq!(entry.end_display, "9:30 AM");
        assert!(!entry.is_all_day);
    }

    #[test]
    fn all_day_dates_anchor_at_local_midnight() {
        let client = client();
        let start = client
            .parse_event_time(&None, &Some("2024-05-01".to_string()))
            .unwrap();
        // Midnight New York on May 1 is 04:00 UTC.
        assert_eq!(start.to_rfc3339(), "2024-05-01T04:00:00+00:00");
    }
}
