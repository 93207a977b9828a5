//! Task model - the unit of work the scheduler drives.

use crate::id::TaskId;
use crate::resource::ResourceSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of a registered task.
///
/// ```text
/// Idle → Scheduled → Running → Ending → Idle
///            └──────────┴─ interrupted ─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskState {
    /// Not scheduled
    #[default]
    Idle,
    /// Scheduled, waiting for `initialize`
    Scheduled,
    /// Initialized and executing every cycle
    Running,
    /// Inside its `end` callback
    Ending,
}

impl TaskState {
    /// Whether the task currently holds its requirements.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Scheduled | Self::Running)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Scheduled => "SCHEDULED",
            Self::Running => "RUNNING",
            Self::Ending => "ENDING",
        };
        f.write_str(s)
    }
}

/// A scheduling request raised from inside a task callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Schedule the task at the start of the next cycle.
    Schedule(TaskId),
    /// Cancel the task once the requesting callback returns.
    Cancel(TaskId),
}

impl Request {
    /// Task the request refers to.
    pub fn task(self) -> TaskId {
        match self {
            Self::Schedule(id) | Self::Cancel(id) => id,
        }
    }
}

/// What a task callback can see and ask for.
///
/// The context never hands out the scheduler itself. Callbacks read task
/// states through it and queue [`Request`]s that the scheduler applies
/// outside the callback.
pub struct TaskContext<'a> {
    now: Duration,
    cycle: u64,
    states: &'a [TaskState],
    requests: &'a mut Vec<Request>,
}

impl<'a> TaskContext<'a> {
    /// Create a context over a state table and a request queue.
    pub fn new(
        now: Duration,
        cycle: u64,
        states: &'a [TaskState],
        requests: &'a mut Vec<Request>,
    ) -> Self {
        Self {
            now,
            cycle,
            states,
            requests,
        }
    }

    /// Scheduler time at the start of the current cycle.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Index of the current cycle.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Recorded state of a registered task.
    pub fn state(&self, id: TaskId) -> TaskState {
        self.states.get(id.index()).copied().unwrap_or_default()
    }

    /// Whether `id` is active, counting requests not yet applied.
    pub fn is_active(&self, id: TaskId) -> bool {
        match self.requests.iter().rev().find(|r| r.task() == id) {
            Some(Request::Schedule(_)) => true,
            Some(Request::Cancel(_)) => false,
            None => self.state(id).is_active(),
        }
    }

    /// Ask the scheduler to schedule a registered task.
    pub fn schedule(&mut self, id: TaskId) {
        self.requests.push(Request::Schedule(id));
    }

    /// Ask the scheduler to cancel a registered task.
    pub fn cancel(&mut self, id: TaskId) {
        self.requests.push(Request::Cancel(id));
    }
}

/// A schedulable unit of work.
///
/// The scheduler calls `initialize` once, then `execute` followed by
/// `is_finished` every cycle, then `end` exactly once. `end` receives
/// `true` when the task was interrupted or canceled.
///
/// `requirements` must return the same set for the whole lifetime of the
/// task.
pub trait Task {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Resources this task holds while active.
    fn requirements(&self) -> &ResourceSet;

    /// Called once when the task starts running.
    fn initialize(&mut self, _ctx: &mut TaskContext<'_>) {}

    /// Called every cycle while running.
    fn execute(&mut self, _ctx: &mut TaskContext<'_>) {}

    /// Whether the task has completed.
    fn is_finished(&self, _ctx: &TaskContext<'_>) -> bool {
        false
    }

    /// Called once when the task stops.
    fn end(&mut self, _interrupted: bool, _ctx: &mut TaskContext<'_>) {}

    /// Whether this task, or anything nested in it, runs work outside its
    /// own requirement set through a proxy.
    fn contains_proxy(&self) -> bool {
        false
    }
}

impl<T: Task + ?Sized> Task for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn requirements(&self) -> &ResourceSet {
        (**self).requirements()
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        (**self).initialize(ctx)
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) {
        (**self).execute(ctx)
    }

    fn is_finished(&self, ctx: &TaskContext<'_>) -> bool {
        (**self).is_finished(ctx)
    }

    fn end(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        (**self).end(interrupted, ctx)
    }

    fn contains_proxy(&self) -> bool {
        (**self).contains_proxy()
    }
}

/// Read-only description of a task handed to observers.
#[derive(Debug, Clone, Copy)]
pub struct TaskInfo<'a> {
    /// Handle of the task
    pub id: TaskId,
    /// Task name
    pub name: &'a str,
    /// Declared requirements
    pub requirements: &'a ResourceSet,
}
