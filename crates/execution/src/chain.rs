//! Event-linked sequences.
//!
//! Instead of nesting tasks in one composite, each task is registered on
//! its own and the end of one task raises a signal whose rising edge
//! schedules the next. Nothing holds the union of requirements, and each
//! boundary costs one cycle: the signal raised in `end` is sampled on the
//! following cycle.

use crate::error::Result;
use crate::scheduler::Scheduler;
use interlock_core::{ConstructionError, ResourceSet, Signal, Task, TaskContext, TaskId};
use tracing::debug;

/// Wraps a task and pulses a signal whenever it ends, interrupted or not.
struct Pulsing {
    inner: Box<dyn Task>,
    signal: Signal,
}

impl Task for Pulsing {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn requirements(&self) -> &ResourceSet {
        self.inner.requirements()
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        self.inner.initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) {
        self.inner.execute(ctx)
    }

    fn is_finished(&self, ctx: &TaskContext<'_>) -> bool {
        self.inner.is_finished(ctx)
    }

    fn end(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        self.inner.end(interrupted, ctx);
        self.signal.pulse();
    }

    fn contains_proxy(&self) -> bool {
        self.inner.contains_proxy()
    }
}

impl Scheduler {
    /// Register `tasks` as a chain and return the handle of the first.
    ///
    /// Scheduling the first task runs the rest in order, one after the
    /// other. Each task may also be scheduled on its own; whenever a task
    /// other than the last ends, its successor is scheduled next cycle.
    pub fn chain(&mut self, tasks: Vec<Box<dyn Task>>) -> Result<TaskId> {
        if tasks.is_empty() {
            return Err(ConstructionError::EmptyChain.into());
        }

        let count = tasks.len();
        let mut first = None;
        let mut previous: Option<Signal> = None;

        for (i, task) in tasks.into_iter().enumerate() {
            let last = i + 1 == count;
            let next_signal = (!last).then(Signal::new);

            let id = match &next_signal {
                Some(signal) => self.add(Pulsing {
                    inner: task,
                    signal: signal.clone(),
                })?,
                None => self.add(task)?,
            };

            if let Some(signal) = previous.take() {
                self.on_rising(signal.event(), id)?;
            }
            first.get_or_insert(id);
            previous = next_signal;
        }

        debug!("Chained {} tasks", count);
        first.ok_or_else(|| ConstructionError::EmptyChain.into())
    }
}
