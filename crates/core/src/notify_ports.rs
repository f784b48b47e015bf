//! Notification sink port interface
//!
//! Fire-and-forget delivery of reminders, digests, and short replies. The
//! sink owns transport, channel resolution, and final text markup; the core
//! supplies the content.

use async_trait::async_trait;
use nudge_domain::{DigestEntry, Result};

/// Content of one reminder message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotice {
    pub title: String,
    /// Whole minutes until start; negative once the meeting has begun.
    pub minutes_until_start: i64,
    /// 1-based reminder ordinal for this meeting.
    pub ping_ordinal: u32,
    /// The phrase the user replies with to stop further reminders.
    pub confirmation_phrase: String,
}

/// Trait for delivering messages to one user.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a meeting reminder.
    async fn send_reminder(&self, slack_user_id: &str, notice: &ReminderNotice) -> Result<()>;

    /// Deliver a daily digest. An empty `entries` slice must still produce
    /// a "no meetings" message.
    async fn send_digest(
        &self,
        slack_user_id: &str,
        header: &str,
        entries: &[DigestEntry],
    ) -> Result<()>;

    /// Deliver a short plain reply (confirmation acks, usage hints).
    async fn send_note(&self, slack_user_id: &str, text: &str) -> Result<()>;
}
