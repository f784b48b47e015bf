//! Per-user scheduling: the poll-and-notify tick, digest dedup, and the
//! inbound command grammar.

pub mod command;
pub mod service;

pub use command::{parse_command, InboundCommand};
pub use service::UserScheduler;
