//! Per-meeting reminder state machine

pub mod service;

pub use service::PingTracker;
