//! Construction-time errors.

use crate::id::{ResourceId, TaskId};
use thiserror::Error;

/// Error raised while building a task, composite or resource binding.
///
/// These are fatal to the offending construction only. Runtime scheduling
/// conflicts are never reported here; they are resolved by interruption.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// Two concurrent children of a composite declare the same resource.
    #[error("tasks '{first}' and '{second}' both require {resource} and cannot run concurrently")]
    SharedRequirement {
        /// The contested resource
        resource: ResourceId,
        /// Name of the earlier child
        first: String,
        /// Name of the later child
        second: String,
    },

    /// The resource already has a default task.
    #[error("default task already set for {resource}")]
    DefaultTaskAlreadySet {
        /// Resource whose slot is taken
        resource: ResourceId,
    },

    /// A default task must require the resource it is the default for.
    #[error("default task {task} does not require {resource}")]
    DefaultTaskMissingRequirement {
        /// Resource being configured
        resource: ResourceId,
        /// Offending task
        task: TaskId,
    },

    /// A task requires a resource the scheduler never registered.
    #[error("task '{task}' requires unregistered {resource}")]
    UnknownResource {
        /// The unregistered resource
        resource: ResourceId,
        /// Name of the task requiring it
        task: String,
    },

    /// Repeating a task that schedules proxied work is not supported.
    #[error("task '{task}' contains a proxy and cannot be repeated")]
    RepeatedProxy {
        /// Name of the rejected task
        task: String,
    },

    /// A chained sequence needs at least one task.
    #[error("chained sequence requires at least one task")]
    EmptyChain,
}
