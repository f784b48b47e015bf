//! # Nudge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The per-meeting ping state machine ([`PingTracker`])
//! - The per-user scheduling tick and digest dedup ([`UserScheduler`])
//! - The inbound command grammar ([`schedule::command`])
//! - Port/adapter interfaces (traits) for the calendar source and the
//!   notification sink
//!
//! ## Architecture Principles
//! - Only depends on `nudge-domain`
//! - No HTTP, socket, or platform code
//! - All external collaborators via traits
//! - Every operation takes `now` explicitly; one captured instant drives a
//!   whole tick, so the core is deterministic under test

pub mod schedule;
pub mod tracker;

// Infrastructure ports
pub mod calendar_ports;
pub mod notify_ports;

pub use calendar_ports::MeetingSource;
pub use notify_ports::{Notifier, ReminderNotice};
pub use schedule::command::{parse_command, InboundCommand};
pub use schedule::UserScheduler;
pub use tracker::PingTracker;
