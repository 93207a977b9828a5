//! Scheduler errors.

use interlock_core::{ConstructionError, ResourceId, TaskId};
use thiserror::Error;

/// Errors returned by scheduler operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The handle does not name a task registered with this scheduler.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// The handle does not name a resource registered with this scheduler.
    #[error("unknown resource: {0}")]
    UnknownResource(ResourceId),

    /// Building a task or binding failed.
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
