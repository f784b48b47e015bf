//! Common data types used throughout the application

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Immutable snapshot of one calendar event at fetch time.
///
/// Identity is `event_id`: two fetches of the same event may differ in every
/// other field (a retitled meeting is still the same meeting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub event_id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_all_day: bool,
    pub is_declined: bool,
    pub html_link: Option<String>,
}

impl Meeting {
    /// Whole minutes until the meeting starts. Negative once it has started.
    #[must_use]
    pub fn minutes_until_start(&self, now: DateTime<Utc>) -> i64 {
        (self.start_time - now).num_seconds() / 60
    }
}

/// Reminder lifecycle for one tracked meeting.
///
/// `Confirmed` and `Expired` are terminal: no further reminders, no further
/// transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PingStatus {
    Pending,
    Pinging,
    Confirmed,
    Expired,
}

impl PingStatus {
    /// True for `Confirmed` and `Expired`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Expired)
    }
}

/// Mutable per-meeting tracking record, owned exclusively by one user's
/// ping tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingState {
    /// Latest snapshot of the meeting this record was created from.
    pub meeting: Meeting,
    pub status: PingStatus,
    /// Instant of the last reminder sent, if any.
    pub last_ping_at: Option<DateTime<Utc>>,
    /// Monotonically increasing reminder counter.
    pub ping_count: u32,
}

impl PingState {
    /// Create a fresh `Pending` record for a newly observed meeting.
    #[must_use]
    pub fn new(meeting: Meeting) -> Self {
        Self { meeting, status: PingStatus::Pending, last_ping_at: None, ping_count: 0 }
    }
}

/// Which daily digest a key or window refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    Morning,
    Evening,
}

impl DigestKind {
    /// Stable name used in dedup keys and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
        }
    }

    /// Dedup key for this digest on a given local calendar day,
    /// e.g. `"morning-2024-05-01"`.
    #[must_use]
    pub fn dedup_key(self, local_date: NaiveDate) -> String {
        format!("{}-{}", self.as_str(), local_date.format("%Y-%m-%d"))
    }
}

/// Simplified meeting summary for digest rendering.
///
/// All-day meetings carry no display times and render distinctly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestEntry {
    pub title: String,
    /// Local display time, e.g. `"9:30 AM"`. `"All day"` for all-day events.
    pub start_display: String,
    /// Local display time. Empty for all-day events.
    pub end_display: String,
    pub is_all_day: bool,
}

/// One registered user: notification target plus calendar source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Slack user id, also the routing key for inbound events.
    pub slack_user_id: String,
    /// OAuth refresh token for the user's Google account.
    pub google_refresh_token: String,
    /// Calendar to poll; `"primary"` unless overridden.
    #[serde(default = "default_calendar_id")]
    pub google_calendar_id: String,
    /// Prefix word for confirmations, e.g. `"ok"` in `"ok for Standup"`.
    #[serde(default = "default_confirmation_phrase")]
    pub confirmation_phrase: String,
    /// Optional display name for logs.
    #[serde(default)]
    pub name: String,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_confirmation_phrase() -> String {
    crate::constants::DEFAULT_CONFIRMATION_PHRASE.to_string()
}

impl UserProfile {
    /// Label used in log output: display name when set, Slack id otherwise.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.slack_user_id
        } else {
            &self.name
        }
    }
}
