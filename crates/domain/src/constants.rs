//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Reminder behavior defaults (overridable through configuration)
pub const DEFAULT_PING_LEAD_TIME_MINUTES: i64 = 5;
pub const DEFAULT_PING_INTERVAL_SECONDS: i64 = 60;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 30;
pub const DEFAULT_LOOKAHEAD_MINUTES: i64 = 15;
pub const DEFAULT_CONFIRMATION_PHRASE: &str = "ok";

// Fixed state-machine bounds (not configurable; see PingTracker)
pub const GRACE_PAST_START_MINUTES: i64 = 10;
pub const RETENTION_MINUTES: i64 = 30;

// Digest scheduling
pub const MORNING_DIGEST_HOUR: u32 = 8;
pub const EVENING_DIGEST_HOUR: u32 = 22;
pub const DIGEST_WINDOW_MINUTES: u32 = 2;
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

// Calendar fetch policy defaults (overridable through configuration)
pub const DEFAULT_SKIP_ALL_DAY_EVENTS: bool = true;
pub const DEFAULT_SKIP_DECLINED_EVENTS: bool = true;

// Fallback title for calendar events without a summary
pub const UNTITLED_MEETING: &str = "(No title)";

// Health server
pub const DEFAULT_PORT: u16 = 8080;
