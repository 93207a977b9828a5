//! Lifecycle observers.

use interlock_core::TaskInfo;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tracing::info;

/// Receives lifecycle events for tasks the scheduler drives directly.
///
/// Composite children are invisible here. Observers must not try to
/// reach back into the scheduler.
pub trait SchedulerObserver {
    /// A task ran `initialize`.
    fn on_task_initialized(&mut self, _task: TaskInfo<'_>) {}

    /// A task ran `execute`.
    fn on_task_executed(&mut self, _task: TaskInfo<'_>) {}

    /// A task finished on its own.
    fn on_task_finished(&mut self, _task: TaskInfo<'_>) {}

    /// A task was interrupted or canceled.
    fn on_task_interrupted(&mut self, _task: TaskInfo<'_>) {}
}

/// Which [`TaskLog`] events are written to the log.
#[derive(Debug, Clone)]
pub struct TaskLogConfig {
    /// Log initializations
    pub initialized: bool,
    /// Log the first execute after each initialize
    pub executed: bool,
    /// Log natural finishes
    pub finished: bool,
    /// Log interruptions
    pub interrupted: bool,
    /// Task names never logged
    pub excluded: BTreeSet<String>,
}

impl Default for TaskLogConfig {
    fn default() -> Self {
        Self {
            initialized: true,
            executed: true,
            finished: true,
            interrupted: true,
            excluded: BTreeSet::new(),
        }
    }
}

impl TaskLogConfig {
    /// Log every event kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle execute logging.
    pub fn with_executed(mut self, enabled: bool) -> Self {
        self.executed = enabled;
        self
    }

    /// Toggle initialize logging.
    pub fn with_initialized(mut self, enabled: bool) -> Self {
        self.initialized = enabled;
        self
    }

    /// Toggle finish logging.
    pub fn with_finished(mut self, enabled: bool) -> Self {
        self.finished = enabled;
        self
    }

    /// Toggle interrupt logging.
    pub fn with_interrupted(mut self, enabled: bool) -> Self {
        self.interrupted = enabled;
        self
    }

    /// Never log the task named `name`.
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded.insert(name.into());
        self
    }
}

/// Observer that counts executes per task and logs transitions.
///
/// Counts reset on every initialize, finish and interrupt. The log is
/// cheap to clone; every clone shares the same counts, so one clone can
/// be handed to the scheduler and another kept for [`TaskLog::summary`].
#[derive(Clone, Default)]
pub struct TaskLog {
    config: Rc<TaskLogConfig>,
    runs: Rc<RefCell<BTreeMap<String, u64>>>,
}

impl TaskLog {
    /// Create a log with the given configuration.
    pub fn new(config: TaskLogConfig) -> Self {
        Self {
            config: Rc::new(config),
            runs: Rc::default(),
        }
    }

    /// Executes recorded for `name` since its last transition.
    pub fn runs(&self, name: &str) -> u64 {
        self.runs.borrow().get(name).copied().unwrap_or(0)
    }

    /// One `name count` line per task seen, sorted by name.
    pub fn summary(&self) -> Vec<String> {
        self.runs
            .borrow()
            .iter()
            .map(|(name, count)| format!("{} {}", name, count))
            .collect()
    }

    fn excluded(&self, name: &str) -> bool {
        self.config.excluded.contains(name)
    }

    fn take_runs(&self, name: &str) -> u64 {
        self.runs
            .borrow_mut()
            .insert(name.to_string(), 0)
            .unwrap_or(0)
    }
}

impl SchedulerObserver for TaskLog {
    fn on_task_initialized(&mut self, task: TaskInfo<'_>) {
        self.take_runs(task.name);
        if self.config.initialized && !self.excluded(task.name) {
            info!("Task initialized: {} ({})", task.name, task.id);
        }
    }

    fn on_task_executed(&mut self, task: TaskInfo<'_>) {
        let first = {
            let mut runs = self.runs.borrow_mut();
            let count = runs.entry(task.name.to_string()).or_insert(0);
            *count += 1;
            *count == 1
        };
        if first && self.config.executed && !self.excluded(task.name) {
            info!("Task executed: {} ({})", task.name, task.id);
        }
    }

    fn on_task_finished(&mut self, task: TaskInfo<'_>) {
        let runs = self.take_runs(task.name);
        if self.config.finished && !self.excluded(task.name) {
            info!("Task finished: {} ({}) after {} runs", task.name, task.id, runs);
        }
    }

    fn on_task_interrupted(&mut self, task: TaskInfo<'_>) {
        let runs = self.take_runs(task.name);
        if self.config.interrupted && !self.excluded(task.name) {
            info!("Task interrupted: {} ({}) after {} runs", task.name, task.id, runs);
        }
    }
}
