//! Shared test helpers for `nudge-core` integration tests.
//!
//! These helpers provide reusable fixtures and lightweight mocks so that
//! scheduler tests can focus on behaviour instead of boilerplate.

pub mod ports;

use chrono::{DateTime, Duration, Utc};
use nudge_domain::Meeting;

/// A timed meeting starting `start_offset_min` after `now`.
pub fn meeting_at(id: &str, title: &str, now: DateTime<Utc>, start_offset_min: i64) -> Meeting {
    let start = now + Duration::minutes(start_offset_min);
    Meeting {
        event_id: id.to_string(),
        title: title.to_string(),
        start_time: start,
        end_time: start + Duration::minutes(30),
        is_all_day: false,
        is_declined: false,
        html_link: None,
    }
}
