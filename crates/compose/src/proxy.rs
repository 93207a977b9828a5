//! Proxy decorator.

use interlock_core::{ResourceSet, Task, TaskContext, TaskId};

/// Drives a separately scheduled task without claiming its resources.
///
/// The target lives in the scheduler's arena and is scheduled on its own
/// when the proxy initializes, so its requirements are claimed and released
/// on the normal conflict path instead of through the proxy's parent. The
/// proxy finishes once the target is no longer active and cancels the
/// target when it is interrupted.
///
/// A proxy around a composite does not proxy the composite's children.
pub struct Proxy {
    name: String,
    target: TaskId,
    requirements: ResourceSet,
}

impl Proxy {
    /// Create a proxy for the registered task `target`.
    pub fn new(target: TaskId, target_name: &str) -> Self {
        Self {
            name: format!("Proxy({})", target_name),
            target,
            requirements: ResourceSet::new(),
        }
    }

    /// Handle of the proxied task.
    pub fn target(&self) -> TaskId {
        self.target
    }
}

impl Task for Proxy {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        ctx.schedule(self.target);
    }

    fn is_finished(&self, ctx: &TaskContext<'_>) -> bool {
        !ctx.is_active(self.target)
    }

    fn end(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        if interrupted {
            ctx.cancel(self.target);
        }
    }

    fn contains_proxy(&self) -> bool {
        true
    }
}
