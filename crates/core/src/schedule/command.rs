//! Inbound message grammar
//!
//! The core reacts to exactly three message forms: `today`, `tomorrow`, and
//! the prefix-stripped confirmation `"<phrase> for <meeting name>"`. All
//! other text is not a command and is silently ignored.

/// A recognized inbound command from a registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCommand {
    /// On-demand digest of today's meetings.
    Today,
    /// On-demand digest of tomorrow's meetings.
    Tomorrow,
    /// A confirmation attempt with the extracted meeting-name fragment.
    Confirm(String),
    /// The confirmation prefix matched but no meeting name followed.
    ConfirmMissingName,
}

/// Parse raw message text against a user's confirmation phrase.
///
/// Matching is case-insensitive. Returns `None` for anything that is not a
/// command; such messages are ignored, never treated as errors.
#[must_use]
pub fn parse_command(raw: &str, confirmation_phrase: &str) -> Option<InboundCommand> {
    let text = raw.trim().to_lowercase();

    match text.as_str() {
        "today" => return Some(InboundCommand::Today),
        "tomorrow" => return Some(InboundCommand::Tomorrow),
        _ => {}
    }

    let prefix = format!("{} for", confirmation_phrase.to_lowercase());
    let rest = text.strip_prefix(&prefix)?;
    // Reject accidental matches like "ok forever".
    if !(rest.is_empty() || rest.starts_with(' ')) {
        return None;
    }

    let fragment = rest.trim();
    if fragment.is_empty() {
        Some(InboundCommand::ConfirmMissingName)
    } else {
        Some(InboundCommand::Confirm(fragment.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_commands_match_exactly() {
        assert_eq!(parse_command("today", "ok"), Some(InboundCommand::Today));
        assert_eq!(parse_command("  Tomorrow ", "ok"), Some(InboundCommand::Tomorrow));
        assert_eq!(parse_command("today please", "ok"), None);
    }

    #[test]
    fn confirmation_prefix_extracts_fragment() {
        assert_eq!(
            parse_command("ok for Standup", "ok"),
            Some(InboundCommand::Confirm("standup".to_string()))
        );
        assert_eq!(
            parse_command("OK FOR team sync", "ok"),
            Some(InboundCommand::Confirm("team sync".to_string()))
        );
    }

    #[test]
    fn per_user_phrase_is_honored() {
        assert_eq!(
            parse_command("done for retro", "done"),
            Some(InboundCommand::Confirm("retro".to_string()))
        );
        assert_eq!(parse_command("ok for retro", "done"), None);
    }

    #[test]
    fn empty_fragment_is_a_usage_error() {
        assert_eq!(parse_command("ok for", "ok"), Some(InboundCommand::ConfirmMissingName));
        assert_eq!(parse_command("ok for    ", "ok"), Some(InboundCommand::ConfirmMissingName));
    }

    #[test]
    fn unrelated_text_is_ignored() {
        assert_eq!(parse_command("hello there", "ok"), None);
        assert_eq!(parse_command("ok", "ok"), None);
        assert_eq!(parse_command("ok forever", "ok"), None);
        assert_eq!(parse_command("", "ok"), None);
    }
}
