//! Task scheduling: the fleet polling loop and inbound message routing.

pub mod error;
pub mod fleet_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use fleet_scheduler::{FleetScheduler, FleetSchedulerConfig};
