//! Configuration structures
//!
//! Sectioned application configuration. Values are populated by the infra
//! config loader (environment first, file fallback); defaults here mirror
//! the documented behavior knobs.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_LOOKAHEAD_MINUTES, DEFAULT_PING_INTERVAL_SECONDS, DEFAULT_PING_LEAD_TIME_MINUTES,
    DEFAULT_POLL_INTERVAL_SECONDS, DEFAULT_PORT, DEFAULT_SKIP_ALL_DAY_EVENTS,
    DEFAULT_SKIP_DECLINED_EVENTS, DEFAULT_TIMEZONE, EVENING_DIGEST_HOUR, MORNING_DIGEST_HOUR,
};
use crate::errors::{NudgeError, Result};
use crate::types::UserProfile;

/// Reminder and polling behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Shared tick interval for the fleet loop.
    pub poll_interval_seconds: u64,
    /// How far before start a meeting enters its ping window.
    pub ping_lead_time_minutes: i64,
    /// Minimum spacing between two reminders for the same meeting.
    pub ping_interval_seconds: i64,
    /// Calendar fetch window per tick.
    pub lookahead_minutes: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            ping_lead_time_minutes: DEFAULT_PING_LEAD_TIME_MINUTES,
            ping_interval_seconds: DEFAULT_PING_INTERVAL_SECONDS,
            lookahead_minutes: DEFAULT_LOOKAHEAD_MINUTES,
        }
    }
}

/// Daily digest scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Local hour for the "what's today" digest.
    pub morning_hour: u32,
    /// Local hour for the "what's tomorrow" digest.
    pub evening_hour: u32,
    /// IANA timezone name used for local-day computation.
    pub timezone: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            morning_hour: MORNING_DIGEST_HOUR,
            evening_hour: EVENING_DIGEST_HOUR,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl DigestConfig {
    /// Parse the configured timezone name.
    ///
    /// # Errors
    /// Returns `NudgeError::Config` when the name is not a valid IANA
    /// timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| NudgeError::Config(format!("invalid timezone: {}", self.timezone)))
    }
}

/// Google Calendar API access (shared app credentials; tokens are per-user).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Drop all-day events from fetches.
    pub skip_all_day_events: bool,
    /// Drop events the user has declined.
    pub skip_declined_events: bool,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            skip_all_day_events: DEFAULT_SKIP_ALL_DAY_EVENTS,
            skip_declined_events: DEFAULT_SKIP_DECLINED_EVENTS,
        }
    }
}

/// Slack bot access (shared across all users).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub bot_token: String,
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub digest: DigestConfig,
    pub google: GoogleConfig,
    pub slack: SlackConfig,
    /// Registered users; an empty list is a startup configuration error.
    pub users: Vec<UserProfile>,
    /// Port for the health/events HTTP server.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            digest: DigestConfig::default(),
            google: GoogleConfig::default(),
            slack: SlackConfig::default(),
            users: Vec::new(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Validate invariants the loader cannot express structurally.
    ///
    /// # Errors
    /// Returns `NudgeError::Config` for an empty user list, a bad timezone,
    /// or a zero poll interval.
    pub fn validate(&self) -> Result<()> {
        if self.users.is_empty() {
            return Err(NudgeError::Config(
                "no users configured; set NUDGE_USERS_JSON or provide a users file".into(),
            ));
        }
        if self.scheduler.poll_interval_seconds == 0 {
            return Err(NudgeError::Config("poll_interval_seconds must be positive".into()));
        }
        self.digest.tz()?;
        Ok(())
    }
}
