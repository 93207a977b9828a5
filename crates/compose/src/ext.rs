//! Fluent combinators on any task.

use crate::{Deadline, ParallelAll, RaceAny, Repeat, Sequence, Timeout};
use interlock_core::{ConstructionError, ResourceSet, Task, TaskContext};
use std::time::Duration;

/// Renames a task without changing its behavior.
pub struct Named<T> {
    name: String,
    inner: T,
}

impl<T: Task> Named<T> {
    /// Wrap `inner` under `name`.
    pub fn new(inner: T, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    /// Unwrap the inner task.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Task> Task for Named<T> {
    fn name(&self) -> &str {
        &self.name
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
        self.inner.end(interrupted, ctx)
    }

    fn contains_proxy(&self) -> bool {
        self.inner.contains_proxy()
    }
}

/// Combinators available on every `'static` task.
pub trait TaskExt: Task + Sized + 'static {
    /// Erase the concrete type.
    fn boxed(self) -> Box<dyn Task> {
        Box::new(self)
    }

    /// Give the task a different name.
    fn named(self, name: impl Into<String>) -> Named<Self> {
        Named::new(self, name)
    }

    /// Interrupt the task after `duration`.
    fn with_timeout(self, duration: Duration) -> Timeout {
        Timeout::new(self.boxed(), duration)
    }

    /// Restart the task every time it finishes.
    fn repeatedly(self) -> Result<Repeat, ConstructionError> {
        Repeat::new(self.boxed())
    }

    /// Run `next` after this task finishes.
    fn and_then(self, next: impl Task + 'static) -> Sequence {
        Sequence::new(vec![self.boxed(), Box::new(next)])
    }

    /// Run alongside `other` until both finish.
    fn along_with(self, other: impl Task + 'static) -> Result<ParallelAll, ConstructionError> {
        ParallelAll::new(vec![self.boxed(), Box::new(other)])
    }

    /// Run alongside `other` until either finishes.
    fn race_with(self, other: impl Task + 'static) -> Result<RaceAny, ConstructionError> {
        RaceAny::new(vec![self.boxed(), Box::new(other)])
    }

    /// Run `others` alongside this task and stop them when it finishes.
    fn deadline_for(self, others: Vec<Box<dyn Task>>) -> Result<Deadline, ConstructionError> {
        Deadline::new(self.boxed(), others)
    }
}

impl<T: Task + 'static> TaskExt for T {}
