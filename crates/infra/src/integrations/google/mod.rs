//! Google Calendar integration
//!
//! Implements the core's `MeetingSource` port against the Calendar v3 REST
//! API with headless refresh-token authentication.

pub mod client;
pub mod types;

pub use client::GoogleCalendarClient;
