//! Closure-backed leaf tasks.

use crate::resource::ResourceSet;
use crate::task::{Task, TaskContext};
use std::time::Duration;

type Action = Box<dyn FnMut(&mut TaskContext<'_>)>;
type EndAction = Box<dyn FnMut(bool, &mut TaskContext<'_>)>;
type FinishCheck = Box<dyn Fn(&TaskContext<'_>) -> bool>;

/// A task assembled from optional closures.
///
/// Missing callbacks do nothing; a missing finish check never finishes.
pub struct FunctionalTask {
    name: String,
    requirements: ResourceSet,
    on_initialize: Option<Action>,
    on_execute: Option<Action>,
    finished: Option<FinishCheck>,
    on_end: Option<EndAction>,
}

impl FunctionalTask {
    /// Create a task with no requirements and no behavior.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: ResourceSet::new(),
            on_initialize: None,
            on_execute: None,
            finished: None,
            on_end: None,
        }
    }

    /// Set the required resources.
    pub fn requires(mut self, requirements: impl Into<ResourceSet>) -> Self {
        self.requirements = requirements.into();
        self
    }

    /// Set the initialize callback.
    pub fn on_initialize(mut self, f: impl FnMut(&mut TaskContext<'_>) + 'static) -> Self {
        self.on_initialize = Some(Box::new(f));
        self
    }

    /// Set the execute callback.
    pub fn on_execute(mut self, f: impl FnMut(&mut TaskContext<'_>) + 'static) -> Self {
        self.on_execute = Some(Box::new(f));
        self
    }

    /// Set the finish check.
    pub fn finished_when(mut self, f: impl Fn(&TaskContext<'_>) -> bool + 'static) -> Self {
        self.finished = Some(Box::new(f));
        self
    }

    /// Set the end callback.
    pub fn on_end(mut self, f: impl FnMut(bool, &mut TaskContext<'_>) + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }
}

impl Task for FunctionalTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        if let Some(f) = self.on_initialize.as_mut() {
            f(ctx);
        }
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) {
        if let Some(f) = self.on_execute.as_mut() {
            f(ctx);
        }
    }

    fn is_finished(&self, ctx: &TaskContext<'_>) -> bool {
        self.finished.as_ref().is_some_and(|f| f(ctx))
    }

    fn end(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        if let Some(f) = self.on_end.as_mut() {
            f(interrupted, ctx);
        }
    }
}

/// Run `action` once on initialize and finish immediately.
pub fn run_once(
    name: impl Into<String>,
    requirements: impl Into<ResourceSet>,
    mut action: impl FnMut() + 'static,
) -> FunctionalTask {
    FunctionalTask::new(name)
        .requires(requirements)
        .on_initialize(move |_| action())
        .finished_when(|_| true)
}

/// Run `action` every cycle; never finishes on its own.
pub fn run(
    name: impl Into<String>,
    requirements: impl Into<ResourceSet>,
    mut action: impl FnMut() + 'static,
) -> FunctionalTask {
    FunctionalTask::new(name)
        .requires(requirements)
        .on_execute(move |_| action())
}

/// Hold `requirements` and do nothing until interrupted.
pub fn idle(name: impl Into<String>, requirements: impl Into<ResourceSet>) -> FunctionalTask {
    FunctionalTask::new(name).requires(requirements)
}

/// Finish once `duration` has elapsed since initialize.
pub fn wait(duration: Duration) -> Wait {
    Wait::new(duration)
}

/// A requirement-free delay measured on the scheduler clock.
pub struct Wait {
    name: String,
    duration: Duration,
    started: Duration,
    requirements: ResourceSet,
}

impl Wait {
    /// Create a wait of `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            name: format!("Wait({:.3}s)", duration.as_secs_f64()),
            duration,
            started: Duration::ZERO,
            requirements: ResourceSet::new(),
        }
    }
}

impl Task for Wait {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        self.started = ctx.now();
    }

    fn is_finished(&self, ctx: &TaskContext<'_>) -> bool {
        ctx.now().saturating_sub(self.started) >= self.duration
    }
}
