//! In-memory mocks for the core's port traits.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nudge_core::{MeetingSource, Notifier, ReminderNotice};
use nudge_domain::{DigestEntry, Meeting, NudgeError, Result as DomainResult};

/// In-memory mock for `MeetingSource`.
///
/// Serves a fixed upcoming snapshot and a fixed digest-day listing, and can
/// be flipped into a failing state to exercise error isolation.
#[derive(Default, Clone)]
pub struct MockMeetingSource {
    upcoming: Arc<Mutex<Vec<Meeting>>>,
    day_entries: Arc<Mutex<Vec<DigestEntry>>>,
    failing: Arc<Mutex<bool>>,
    /// Every local date the scheduler asked a digest listing for.
    pub day_requests: Arc<Mutex<Vec<NaiveDate>>>,
}

impl MockMeetingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the upcoming snapshot served to the scheduler.
    pub fn set_upcoming(&self, meetings: Vec<Meeting>) {
        *self.upcoming.lock().unwrap() = meetings;
    }

    /// Replace the digest-day listing.
    pub fn set_day_entries(&self, entries: Vec<DigestEntry>) {
        *self.day_entries.lock().unwrap() = entries;
    }

    /// Make every fetch fail until reset.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl MeetingSource for MockMeetingSource {
    async fn fetch_upcoming(
        &self,
        _now: DateTime<Utc>,
        _lookahead_minutes: i64,
    ) -> DomainResult<Vec<Meeting>> {
        if *self.failing.lock().unwrap() {
            return Err(NudgeError::Calendar("mock source offline".into()));
        }
        Ok(self.upcoming.lock().unwrap().clone())
    }

    async fn fetch_for_day(&self, local_date: NaiveDate) -> DomainResult<Vec<DigestEntry>> {
        if *self.failing.lock().unwrap() {
            return Err(NudgeError::Calendar("mock source offline".into()));
        }
        self.day_requests.lock().unwrap().push(local_date);
        Ok(self.day_entries.lock().unwrap().clone())
    }
}

/// `Notifier` mock that records every delivery.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    pub reminders: Arc<Mutex<Vec<(String, ReminderNotice)>>>,
    /// (user, header, entry count) per digest.
    pub digests: Arc<Mutex<Vec<(String, String, usize)>>>,
    pub notes: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reminder_count(&self) -> usize {
        self.reminders.lock().unwrap().len()
    }

    pub fn digest_count(&self) -> usize {
        self.digests.lock().unwrap().len()
    }

    pub fn last_note(&self) -> Option<String> {
        self.notes.lock().unwrap().last().map(|(_, text)| text.clone())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_reminder(
        &self,
        slack_user_id: &str,
        notice: &ReminderNotice,
    ) -> DomainResult<()> {
        self.reminders.lock().unwrap().push((slack_user_id.to_string(), notice.clone()));
        Ok(())
    }

    async fn send_digest(
        &self,
        slack_user_id: &str,
        header: &str,
        entries: &[DigestEntry],
    ) -> DomainResult<()> {
        self.digests.lock().unwrap().push((
            slack_user_id.to_string(),
            header.to_string(),
            entries.len(),
        ));
        Ok(())
    }

    async fn send_note(&self, slack_user_id: &str, text: &str) -> DomainResult<()> {
        self.notes.lock().unwrap().push((slack_user_id.to_string(), text.to_string()));
        Ok(())
    }
}
