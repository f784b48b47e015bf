//! Builds the runtime [`Config`].
//!
//! Order of precedence, lowest to highest: built-in defaults, an optional
//! config file (JSON or TOML, probed from the working directory), then
//! `NUDGE_*` environment variables. The user roster comes from
//! `NUDGE_USERS_JSON` (inline) or `NUDGE_USERS_FILE` (path), falling back
//! to any roster already present in the config file.

use std::env;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use nudge_domain::{Config, NudgeError, Result, UserProfile};

const CONFIG_CANDIDATES: &[&str] = &["config.json", "config.toml", "nudge.json", "nudge.toml"];

/// Load the full configuration and validate it.
pub fn load() -> Result<Config> {
    let mut config = match probe_config_file() {
        Some(path) => load_from_file(&path)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config)?;
    load_users(&mut config)?;
    config.validate()?;
    info!(
        users = config.users.len(),
        poll_interval_seconds = config.scheduler.poll_interval_seconds,
        timezone = %config.digest.timezone,
        "configuration loaded"
    );
    Ok(config)
}

/// Parse a config file. Format is chosen by extension: `.toml` parses as
/// TOML, everything else as JSON.
pub fn load_from_file(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| NudgeError::Config(format!("cannot read {}: {e}", path.display())))?;

    let config = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
        toml::from_str(&raw)
            .map_err(|e| NudgeError::Config(format!("invalid TOML in {}: {e}", path.display())))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| NudgeError::Config(format!("invalid JSON in {}: {e}", path.display())))?
    };
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

fn probe_config_file() -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(token) = env_string("NUDGE_SLACK_BOT_TOKEN") {
        config.slack.bot_token = token;
    }
    if let Some(id) = env_string("NUDGE_GOOGLE_CLIENT_ID") {
        config.google.client_id = id;
    }
    if let Some(secret) = env_string("NUDGE_GOOGLE_CLIENT_SECRET") {
        config.google.client_secret = secret;
    }

    if let Some(v) = env_parsed("NUDGE_POLL_INTERVAL_SECONDS")? {
        config.scheduler.poll_interval_seconds = v;
    }
    if let Some(v) = env_parsed("NUDGE_PING_LEAD_TIME_MINUTES")? {
        config.scheduler.ping_lead_time_minutes = v;
    }
    if let Some(v) = env_parsed("NUDGE_PING_INTERVAL_SECONDS")? {
        config.scheduler.ping_interval_seconds = v;
    }
    if let Some(v) = env_parsed("NUDGE_LOOKAHEAD_MINUTES")? {
        config.scheduler.lookahead_minutes = v;
    }
    if let Some(v) = env_parsed("NUDGE_MORNING_DIGEST_HOUR")? {
        config.digest.morning_hour = v;
    }
    if let Some(v) = env_parsed("NUDGE_EVENING_DIGEST_HOUR")? {
        config.digest.evening_hour = v;
    }
    if let Some(tz) = env_string("NUDGE_TIMEZONE") {
        config.digest.timezone = tz;
    }
    if let Some(v) = env_parsed("NUDGE_PORT")? {
        config.port = v;
    }
    if let Some(v) = env_parsed("NUDGE_SKIP_ALL_DAY_EVENTS")? {
        config.google.skip_all_day_events = v;
    }
    if let Some(v) = env_parsed("NUDGE_SKIP_DECLINED_EVENTS")? {
        config.google.skip_declined_events = v;
    }
    Ok(())
}

fn load_users(config: &mut Config) -> Result<()> {
    if let Some(inline) = env_string("NUDGE_USERS_JSON") {
        config.users = parse_users(&inline)?;
        return Ok(());
    }
    if let Some(path) = env_string("NUDGE_USERS_FILE") {
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| NudgeError::Config(format!("cannot read users file {path}: {e}")))?;
        config.users = parse_users(&raw)?;
        return Ok(());
    }
    // Keep any roster the config file provided; otherwise probe users.json.
    if config.users.is_empty() {
        let fallback = Path::new("users.json");
        if fallback.is_file() {
            let raw = std::fs::read_to_string(fallback)
                .map_err(|e| NudgeError::Config(format!("cannot read users.json: {e}")))?;
            config.users = parse_users(&raw)?;
        }
    }
    Ok(())
}

/// Parse a JSON array of user profiles.
pub fn parse_users(raw: &str) -> Result<Vec<UserProfile>> {
    serde_json::from_str(raw)
        .map_err(|e| NudgeError::Config(format!("invalid user roster JSON: {e}")))
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_string(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| NudgeError::Config(format!("cannot parse {key}={raw:?}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_roster() {
        let users = parse_users(
            r#"[
                {
                    "slack_user_id": "U123",
                    "google_refresh_token": "tok",
                    "name": "Alice"
                },
                {
                    "slack_user_id": "U456",
                    "google_refresh_token": "tok2",
                    "google_calendar_id": "work@example.com",
                    "confirmation_phrase": "done",
                    "name": "Bob"
                }
            ]"#,
        )
        .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].google_calendar_id, "primary");
        assert_eq!(users[0].confirmation_phrase, "ok");
        assert_eq!(users[1].google_calendar_id, "work@example.com");
        assert_eq!(users[1].confirmation_phrase, "done");
    }

    #[test]
    fn rejects_malformed_roster() {
        assert!(matches!(
            parse_users("not json"),
            Err(NudgeError::Config(_))
        ));
    }
}
