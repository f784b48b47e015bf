//! Ping tracking service - core reminder state machine
//!
//! One `PingTracker` owns the reminder state for one user's set of
//! meetings: it ingests calendar snapshots, decides which meetings are due
//! a reminder on the current pass, records sent reminders, and resolves
//! user confirmations.
//!
//! State machine per tracked meeting:
//! `Pending → Pinging → Confirmed | Expired`, with `Confirmed`/`Expired`
//! as sinks. Entries are created only by ingestion and removed only by
//! retention cleanup.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use nudge_domain::constants::{GRACE_PAST_START_MINUTES, RETENTION_MINUTES};
use nudge_domain::{Meeting, PingState, PingStatus};
use tracing::{debug, info};

/// Reminder state machine for one user's meetings.
///
/// Storage is keyed by event id in a `BTreeMap`, so iteration order (and
/// therefore confirmation tie-breaking) is deterministic.
pub struct PingTracker {
    lead_time: Duration,
    ping_interval: Duration,
    tracked: BTreeMap<String, PingState>,
}

impl PingTracker {
    /// Create a tracker with the given ping window and reminder cadence.
    #[must_use]
    pub fn new(lead_time_minutes: i64, ping_interval_seconds: i64) -> Self {
        Self {
            lead_time: Duration::minutes(lead_time_minutes),
            ping_interval: Duration::seconds(ping_interval_seconds),
            tracked: BTreeMap::new(),
        }
    }

    /// Merge a full snapshot of upcoming meetings into tracking state.
    ///
    /// New meetings are added as `Pending`. Existing entries are left
    /// alone. Meetings that disappeared from the snapshot and have already
    /// started are marked `Expired`; meetings that vanish before their
    /// start time are left untouched and age out via retention cleanup.
    ///
    /// Ingesting the same snapshot twice is a no-op after the first pass.
    pub fn ingest_snapshot(&mut self, meetings: &[Meeting], now: DateTime<Utc>) {
        for meeting in meetings {
            if !self.tracked.contains_key(&meeting.event_id) {
                info!(
                    title = %meeting.title,
                    start = %meeting.start_time,
                    "now tracking meeting"
                );
                self.tracked.insert(meeting.event_id.clone(), PingState::new(meeting.clone()));
            }
        }

        for state in self.tracked.values_mut() {
            let seen = meetings.iter().any(|m| m.event_id == state.meeting.event_id);
            if !seen && state.meeting.start_time < now && !state.status.is_terminal() {
                info!(title = %state.meeting.title, "meeting left snapshot after start; expiring");
                state.status = PingStatus::Expired;
            }
        }
    }

    /// Select the meetings due a reminder on this pass.
    ///
    /// A non-terminal meeting is in-window when it starts within the lead
    /// time (or has already started), or as a grace case when it started
    /// less than ten minutes ago. In-window meetings transition to
    /// `Pinging` even when rate limiting skips them this pass; the first
    /// reminder is never rate-limited.
    pub fn meetings_to_ping(&mut self, now: DateTime<Utc>) -> Vec<PingState> {
        let mut due = Vec::new();

        for state in self.tracked.values_mut() {
            if state.status.is_terminal() {
                continue;
            }

            let time_until_start = state.meeting.start_time - now;

            let in_ping_window = time_until_start <= self.lead_time;
            let past_start_within_grace = time_until_start < Duration::zero()
                && -time_until_start < Duration::minutes(GRACE_PAST_START_MINUTES);

            if !(in_ping_window || past_start_within_grace) {
                continue;
            }

            state.status = PingStatus::Pinging;

            if let Some(last_ping_at) = state.last_ping_at {
                if now - last_ping_at < self.ping_interval {
                    debug!(title = %state.meeting.title, "reminder rate-limited this pass");
                    continue;
                }
            }

            due.push(state.clone());
        }

        due
    }

    /// Record that a reminder was sent for this meeting.
    ///
    /// Unknown ids are ignored; callers always select from tracked state.
    pub fn mark_pinged(&mut self, event_id: &str, now: DateTime<Utc>) {
        if let Some(state) = self.tracked.get_mut(event_id) {
            state.last_ping_at = Some(now);
            state.ping_count += 1;
        }
    }

    /// Confirm a meeting by case-insensitive substring match against the
    /// titles of currently `Pinging` meetings.
    ///
    /// Returns the confirmed title, or `None` when nothing matches. When a
    /// fragment matches several pinging meetings, the one with the smallest
    /// event id wins (storage iteration order).
    pub fn confirm_by_name(&mut self, fragment: &str) -> Option<String> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        for state in self.tracked.values_mut() {
            if state.status != PingStatus::Pinging {
                continue;
            }
            if state.meeting.title.to_lowercase().contains(&needle) {
                state.status = PingStatus::Confirmed;
                info!(title = %state.meeting.title, "meeting confirmed");
                return Some(state.meeting.title.clone());
            }
        }

        None
    }

    /// Titles of all currently `Pinging` meetings.
    #[must_use]
    pub fn pinging_titles(&self) -> Vec<String> {
        self.tracked
            .values()
            .filter(|s| s.status == PingStatus::Pinging)
            .map(|s| s.meeting.title.clone())
            .collect()
    }

    /// Remove every entry whose meeting ended more than the retention
    /// window ago, regardless of status. Runs every tick to bound memory.
    pub fn cleanup_expired(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::minutes(RETENTION_MINUTES);
        let before = self.tracked.len();
        self.tracked.retain(|_, state| state.meeting.end_time >= cutoff);
        let removed = before - self.tracked.len();
        if removed > 0 {
            debug!(removed, "cleaned up retained meetings");
        }
    }

    /// Count of meetings in `Pending` or `Pinging` (observability only).
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tracked.values().filter(|s| !s.status.is_terminal()).count()
    }

    /// Number of tracked entries, terminal ones included.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }
}
