//! User scheduling service - one user's poll-and-notify cycle
//!
//! A `UserScheduler` drives one ping tracker plus one meeting source:
//! each tick it checks digest windows, fetches the lookahead snapshot,
//! ingests it, sends the due reminders through the notifier, and runs
//! retention cleanup. It also owns digest dedup for the user and resolves
//! inbound commands.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use nudge_domain::constants::DIGEST_WINDOW_MINUTES;
use nudge_domain::{DigestConfig, DigestKind, Result, SchedulerConfig, UserProfile};
use tracing::{debug, info, warn};

use crate::calendar_ports::MeetingSource;
use crate::notify_ports::{Notifier, ReminderNotice};
use crate::schedule::command::InboundCommand;
use crate::tracker::PingTracker;

/// Orchestrates one user's poll-and-notify cycle.
pub struct UserScheduler {
    profile: UserProfile,
    scheduler: SchedulerConfig,
    digest: DigestConfig,
    tz: Tz,
    tracker: PingTracker,
    source: Arc<dyn MeetingSource>,
    notifier: Arc<dyn Notifier>,
    /// Dedup keys of digests already sent, e.g. `"morning-2024-05-01"`.
    sent_digests: HashSet<String>,
}

impl UserScheduler {
    /// Create a scheduler for one registered user.
    ///
    /// # Errors
    /// Returns `NudgeError::Config` when the digest timezone is invalid.
    pub fn new(
        profile: UserProfile,
        scheduler: SchedulerConfig,
        digest: DigestConfig,
        source: Arc<dyn MeetingSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let tz = digest.tz()?;
        let tracker =
            PingTracker::new(scheduler.ping_lead_time_minutes, scheduler.ping_interval_seconds);
        Ok(Self {
            profile,
            scheduler,
            digest,
            tz,
            tracker,
            source,
            notifier,
            sent_digests: HashSet::new(),
        })
    }

    /// The user this scheduler belongs to.
    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Meetings currently pending or pinging (observability only).
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tracker.active_count()
    }

    /// One iteration of the poll loop for this user.
    ///
    /// Order: digests, fetch, ingest, send due reminders, cleanup. `now` is
    /// the single captured instant for the whole pass. Digest failures are
    /// logged and never abort the tick; any other collaborator failure
    /// propagates to the fleet loop, which logs it and moves on to the next
    /// user.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.check_digests(now).await;

        let meetings =
            self.source.fetch_upcoming(now, self.scheduler.lookahead_minutes).await?;
        debug!(
            user = %self.profile.label(),
            count = meetings.len(),
            lookahead_minutes = self.scheduler.lookahead_minutes,
            "fetched upcoming meetings"
        );
        self.tracker.ingest_snapshot(&meetings, now);

        for state in self.tracker.meetings_to_ping(now) {
            let notice = ReminderNotice {
                title: state.meeting.title.clone(),
                minutes_until_start: state.meeting.minutes_until_start(now),
                ping_ordinal: state.ping_count + 1,
                confirmation_phrase: self.profile.confirmation_phrase.clone(),
            };
            self.notifier.send_reminder(&self.profile.slack_user_id, &notice).await?;
            self.tracker.mark_pinged(&state.meeting.event_id, now);
            info!(
                user = %self.profile.label(),
                title = %notice.title,
                ordinal = notice.ping_ordinal,
                minutes_until = notice.minutes_until_start,
                "sent reminder"
            );
        }

        self.tracker.cleanup_expired(now);
        Ok(())
    }

    /// Resolve an inbound command from this user.
    ///
    /// Confirmation outcomes are reported back to the sender as short notes;
    /// a no-match is a negative acknowledgment, never an error.
    pub async fn handle_command(&mut self, command: InboundCommand, now: DateTime<Utc>) -> Result<()> {
        let phrase = self.profile.confirmation_phrase.clone();
        match command {
            InboundCommand::Today => self.send_today_digest(now).await,
            InboundCommand::Tomorrow => self.send_tomorrow_digest(now).await,
            InboundCommand::Confirm(fragment) => {
                let reply = match self.tracker.confirm_by_name(&fragment) {
                    Some(title) => {
                        info!(user = %self.profile.label(), title = %title, "confirmation accepted");
                        format!("Got it. Stopping pings for *{title}*.")
                    }
                    None => format!(
                        "No active meeting matching \"{fragment}\". \
                         Try `{phrase} for <part of the meeting name>`."
                    ),
                };
                self.notifier.send_note(&self.profile.slack_user_id, &reply).await
            }
            InboundCommand::ConfirmMissingName => {
                let hint = format!("Please specify the meeting: `{phrase} for <meeting name>`");
                self.notifier.send_note(&self.profile.slack_user_id, &hint).await
            }
        }
    }

    /// On-demand digest of today's meetings; bypasses window and dedup.
    pub async fn send_today_digest(&self, now: DateTime<Utc>) -> Result<()> {
        let today = now.with_timezone(&self.tz).date_naive();
        self.send_digest_for(today, &digest_header("Today", today)).await
    }

    /// On-demand digest of tomorrow's meetings; bypasses window and dedup.
    pub async fn send_tomorrow_digest(&self, now: DateTime<Utc>) -> Result<()> {
        let tomorrow = now.with_timezone(&self.tz).date_naive() + Duration::days(1);
        self.send_digest_for(tomorrow, &digest_header("Tomorrow", tomorrow)).await
    }

    /// Send the scheduled digests whose local window contains `now`.
    ///
    /// A digest fires at most once per local calendar day: the dedup key is
    /// recorded before the send, so a failed digest is not retried until the
    /// next day.
    async fn check_digests(&mut self, now: DateTime<Utc>) {
        let local_now = now.with_timezone(&self.tz);
        let local_date = local_now.date_naive();
        let in_window = |hour: u32| {
            local_now.hour() == hour && local_now.minute() < DIGEST_WINDOW_MINUTES
        };

        if in_window(self.digest.morning_hour) {
            let key = DigestKind::Morning.dedup_key(local_date);
            if self.sent_digests.insert(key) {
                if let Err(err) = self.send_today_digest(now).await {
                    warn!(
                        user = %self.profile.label(),
                        error = %err,
                        "failed to send morning digest"
                    );
                }
            }
        }

        if in_window(self.digest.evening_hour) {
            let key = DigestKind::Evening.dedup_key(local_date);
            if self.sent_digests.insert(key) {
                if let Err(err) = self.send_tomorrow_digest(now).await {
                    warn!(
                        user = %self.profile.label(),
                        error = %err,
                        "failed to send evening digest"
                    );
                }
            }
        }
    }

    async fn send_digest_for(&self, local_date: NaiveDate, header: &str) -> Result<()> {
        let entries = self.source.fetch_for_day(local_date).await?;
        self.notifier.send_digest(&self.profile.slack_user_id, header, &entries).await?;
        info!(
            user = %self.profile.label(),
            header,
            meetings = entries.len(),
            "sent digest"
        );
        Ok(())
    }
}

/// Digest header, e.g. `"Today's meetings (Wednesday, May 1)"`.
fn digest_header(day_word: &str, date: NaiveDate) -> String {
    format!("{day_word}'s meetings ({})", date.format("%A, %b %-d"))
}
