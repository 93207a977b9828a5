//! Interlock core data models.
//!
//! This crate defines the building blocks of the cooperative task
//! scheduler: resources, the task lifecycle contract, edge-detected events
//! and the diagnostic trace protocol.

#![warn(missing_docs)]

// Identities
mod id;

// Resources and tasks
mod resource;
mod task;
mod functional;

// Events
mod event;

// Errors
mod error;

// Diagnostics
pub mod trace;

// Re-exports
pub use id::{ResourceId, TaskId};
pub use resource::{Resource, ResourceSet};
pub use task::{Request, Task, TaskContext, TaskInfo, TaskState};
pub use functional::{idle, run, run_once, wait, FunctionalTask, Wait};
pub use event::{Edge, EdgeDetector, Event, Signal};
pub use error::ConstructionError;
pub use trace::{Symbol, Trace, TraceChannel, TraceLine, REPEATED_FRAME_LIMIT};
