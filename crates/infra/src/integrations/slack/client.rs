//! Slack Web API client backing the [`Notifier`] port.
//!
//! Reminders and digests are delivered as direct messages. DM channel ids
//! are resolved once per user through `conversations.open` and cached for
//! the life of the process.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use nudge_core::{Notifier, ReminderNotice};
use nudge_domain::{DigestEntry, NudgeError, Result};

use crate::errors::InfraError;
use crate::http::HttpClient;

const DEFAULT_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<SlackChannel>,
}

#[derive(Debug, Deserialize)]
struct SlackChannel {
    id: String,
}

pub struct SlackClient {
    http: HttpClient,
    api_base: String,
    bot_token: String,
    dm_channels: Mutex<HashMap<String, String>>,
}

impl SlackClient {
    pub fn new(http: HttpClient, bot_token: impl Into<String>) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: bot_token.into(),
            dm_channels: Mutex::new(HashMap::new()),
        }
    }

    /// Point the client at an alternate API base. Used by tests against a
    /// local mock server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<SlackResponse> {
        let url = format!("{}/{method}", self.api_base);
        let response = self
            .http
            .send(
                self.http
                    .request(Method::POST, &url)
                    .bearer_auth(&self.bot_token)
                    .json(&body),
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NudgeError::Notify(format!(
                "slack {method} failed with {status}"
            )));
        }

        let parsed: SlackResponse = response.json().await.map_err(InfraError::from)?;
        if !parsed.ok {
            let reason = parsed.error.as_deref().unwrap_or("unknown");
            warn!(method, reason, "slack api rejected call");
            return Err(NudgeError::Notify(format!(
                "slack {method} rejected: {reason}"
            )));
        }
        Ok(parsed)
    }

    async fn dm_channel(&self, slack_user_id: &str) -> Result<String> {
        {
            let cache = self.dm_channels.lock().await;
            if let Some(channel) = cache.get(slack_user_id) {
                return Ok(channel.clone());
            }
        }

        let response = self
            .call(
                "conversations.open",
                serde_json::json!({ "users": slack_user_id }),
            )
            .await?;
        let channel = response
            .channel
            .map(|c| c.id)
            .ok_or_else(|| NudgeError::Notify("conversations.open returned no channel".into()))?;

        debug!(user = slack_user_id, channel = %channel, "opened dm channel");
        self.dm_channels
            .lock()
            .await
            .insert(slack_user_id.to_string(), channel.clone());
        Ok(channel)
    }

    #[instrument(skip(self, text), fields(user = slack_user_id))]
    async fn post_message(&self, slack_user_id: &str, text: &str) -> Result<()> {
        let channel = self.dm_channel(slack_user_id).await?;
        self.call(
            "chat.postMessage",
            serde_json::json!({ "channel": channel, "text": text }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackClient {
    async fn send_reminder(&self, slack_user_id: &str, notice: &ReminderNotice) -> Result<()> {
        self.post_message(slack_user_id, &reminder_text(notice)).await
    }

    async fn send_digest(
        &self,
        slack_user_id: &str,
        header: &str,
        entries: &[DigestEntry],
    ) -> Result<()> {
        self.post_message(slack_user_id, &digest_text(header, entries))
            .await
    }

    async fn send_note(&self, slack_user_id: &str, text: &str) -> Result<()> {
        self.post_message(slack_user_id, text).await
    }
}

/// Render a reminder DM. The phrasing shifts with the meeting's position
/// relative to now: upcoming, starting, or already started.
pub fn reminder_text(notice: &ReminderNotice) -> String {
    let timing = match notice.minutes_until_start {
        m if m > 0 => format!("starts in {} minute{}", m, plural(m)),
        0 => "is starting NOW".to_string(),
        m => {
            let ago = -m;
            format!("started {} minute{} ago", ago, plural(ago))
        }
    };
    format!(
        "*Meeting Reminder* (ping #{})\n*{}* {}.\nReply `{} for {}` to stop pinging.",
        notice.ping_ordinal, notice.title, timing, notice.confirmation_phrase, notice.title
    )
}

/// Render a digest DM from pre-formatted entries.
pub fn digest_text(header: &str, entries: &[DigestEntry]) -> String {
    if entries.is_empty() {
        return format!("*{header}*\nNo meetings scheduled.");
    }

    let mut lines = vec![format!("*{header}*")];
    if let Some(first_timed) = entries.iter().find(|e| !e.is_all_day) {
        lines.push(format!("Your first meeting is at {}.", first_timed.start_display));
    }
    for entry in entries {
        if entry.is_all_day {
            lines.push(format!("  All day  *{}*", entry.title));
        } else {
            lines.push(format!(
                "  {} - {}  *{}*",
                entry.start_display, entry.end_display, entry.title
            ));
        }
    }
    lines.join("\n")
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
