//! Time-bounded tasks.

use interlock_core::{ResourceSet, Task, TaskContext};
use std::time::Duration;

/// Ends its child, interrupted, once `duration` has elapsed.
///
/// Elapsed time is measured on the scheduler clock from initialize.
pub struct Timeout {
    name: String,
    child: Box<dyn Task>,
    duration: Duration,
    started: Duration,
    child_done: bool,
}

impl Timeout {
    /// Bound `child` to `duration`.
    pub fn new(child: Box<dyn Task>, duration: Duration) -> Self {
        Self {
            name: child.name().to_string(),
            child,
            duration,
            started: Duration::ZERO,
            child_done: false,
        }
    }

    fn expired(&self, ctx: &TaskContext<'_>) -> bool {
        ctx.now().saturating_sub(self.started) >= self.duration
    }
}

impl Task for Timeout {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        self.child.requirements()
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        self.started = ctx.now();
        self.child_done = false;
        self.child.initialize(ctx);
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) {
        if self.child_done {
            return;
        }
        self.child.execute(ctx);
        if self.child.is_finished(ctx) {
            self.child.end(false, ctx);
            self.child_done = true;
        }
    }

    fn is_finished(&self, ctx: &TaskContext<'_>) -> bool {
        self.child_done || self.expired(ctx)
    }

    fn end(&mut self, _interrupted: bool, ctx: &mut TaskContext<'_>) {
        if !self.child_done {
            self.child.end(true, ctx);
            self.child_done = true;
        }
    }

    fn contains_proxy(&self) -> bool {
        self.child.contains_proxy()
    }
}
