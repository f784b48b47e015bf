//! Serde payloads for the Google Calendar v3 API

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GoogleEventsResponse {
    #[serde(default)]
    pub items: Vec<GoogleCalendarEvent>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(default)]
    pub attendees: Vec<GoogleAttendee>,
    #[serde(rename = "htmlLink")]
    pub html_link: Option<String>,
}

impl GoogleCalendarEvent {
    /// All-day events carry `start.date` instead of `start.dateTime`.
    pub fn is_all_day(&self) -> bool {
        self.start.date.is_some() && self.start.date_time.is_none()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }

    /// True when the calendar owner's own attendee entry is declined.
    pub fn is_declined(&self) -> bool {
        self.attendees
            .iter()
            .any(|a| a.is_self && a.response_status.as_deref() == Some("declined"))
    }
}

#[derive(Debug, Deserialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleAttendee {
    #[serde(rename = "self", default)]
    pub is_self: bool,
    #[serde(rename = "responseStatus")]
    pub response_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}
