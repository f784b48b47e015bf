//! # Nudge Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The Google Calendar meeting source (HTTP)
//! - The Slack notifier and inbound events webhook
//! - The fleet scheduler driving the shared polling loop
//! - Configuration loading (environment + file fallback)
//!
//! ## Architecture
//! - Implements traits defined in `nudge-core`
//! - Contains all "impure" code (I/O, HTTP, timers)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;

pub use errors::InfraError;
pub use integrations::google::GoogleCalendarClient;
pub use integrations::slack::{events_router, InboundEvent, SlackClient};
pub use scheduling::{FleetScheduler, FleetSchedulerConfig, SchedulerError, SchedulerResult};
