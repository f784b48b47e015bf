//! Calendar source port interface
//!
//! The core never talks to a calendar API directly; it sees one user's
//! calendar through this trait. Implementations handle authentication,
//! pagination, and timezone parsing of the source API.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nudge_domain::{DigestEntry, Meeting, Result};

/// Trait for fetching normalized meeting records for one user's calendar.
#[async_trait]
pub trait MeetingSource: Send + Sync {
    /// Meetings starting within `[now, now + lookahead_minutes]`, already
    /// filtered for cancelled/all-day/declined events per configured policy.
    async fn fetch_upcoming(
        &self,
        now: DateTime<Utc>,
        lookahead_minutes: i64,
    ) -> Result<Vec<Meeting>>;

    /// Simplified meeting summaries for one local calendar day, for digest
    /// rendering. All-day meetings are represented distinctly from timed
    /// ones.
    async fn fetch_for_day(&self, local_date: NaiveDate) -> Result<Vec<DigestEntry>>;
}
