//! Scheduler error types

use nudge_domain::NudgeError;
use thiserror::Error;

use crate::errors::InfraError;

/// Fleet scheduler lifecycle errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("Scheduler already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("Scheduler not running")]
    NotRunning,

    /// Operation timed out
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let nudge_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                NudgeError::InvalidInput(err.to_string())
            }
            _ => NudgeError::Internal(err.to_string()),
        };
        InfraError(nudge_err)
    }
}

impl From<SchedulerError> for NudgeError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
