//! Slack adapter: outbound DMs via the Web API and inbound messages via
//! the Events API webhook.

pub mod client;
pub mod events;

pub use client::SlackClient;
pub use events::{events_router, InboundEvent};
