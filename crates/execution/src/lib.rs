//! Execution layer - the scheduler, event bindings and disjoint groups.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod observer;
pub mod scheduler;

mod binding;
mod chain;
mod disjoint;

#[cfg(test)]
mod testing;

pub use binding::Trigger;
pub use config::{SchedulerConfig, TimeSource};
pub use error::SchedulerError;
pub use observer::{SchedulerObserver, TaskLog, TaskLogConfig};
pub use scheduler::{CycleReport, Scheduler};
