//! The cooperative scheduler - owns tasks, claims and the cycle loop.

use crate::binding::{Binding, Reaction};
use crate::config::{SchedulerConfig, TimeSource};
use crate::error::{Result, SchedulerError};
use crate::observer::SchedulerObserver;
use interlock_core::{
    ConstructionError, Request, Resource, ResourceId, Task, TaskContext, TaskId, TaskInfo,
    TaskState,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Counts for one call to [`Scheduler::run_cycle`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Index of the cycle
    pub cycle: u64,
    /// Tasks that ran `initialize`
    pub initialized: usize,
    /// Tasks that ran `execute`
    pub executed: usize,
    /// Tasks that finished on their own
    pub finished: usize,
    /// Tasks that were interrupted or canceled
    pub interrupted: usize,
    /// Default tasks started by fill-in
    pub defaults_started: usize,
    /// Wall time spent in the cycle
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy)]
enum Lifecycle {
    Initialized,
    Executed,
    Finished,
    Interrupted,
}

/// Drives registered tasks once per cycle and keeps resources exclusive.
///
/// The run loop for one cycle:
/// ```text
/// deferred requests → events → initialize → execute/finish → default fill-in
/// ```
///
/// At any point, each resource is claimed by at most one scheduled or
/// running task. Scheduling a task interrupts whatever holds any of its
/// requirements.
pub struct Scheduler {
    config: SchedulerConfig,
    resources: Vec<Resource>,
    claims: Vec<Option<TaskId>>,
    tasks: Vec<Box<dyn Task>>,
    states: Vec<TaskState>,
    /// Active tasks in the order they were scheduled
    active: Vec<TaskId>,
    /// Schedule requests raised inside callbacks, applied next cycle
    pending: Vec<Request>,
    pub(crate) bindings: Vec<Binding>,
    observers: Vec<Box<dyn SchedulerObserver>>,
    report: CycleReport,
    cycle: u64,
    now: Duration,
    origin: Instant,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Scheduler {
    /// Create a scheduler with no resources or tasks.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            resources: Vec::new(),
            claims: Vec::new(),
            tasks: Vec::new(),
            states: Vec::new(),
            active: Vec::new(),
            pending: Vec::new(),
            bindings: Vec::new(),
            observers: Vec::new(),
            report: CycleReport::default(),
            cycle: 0,
            now: Duration::ZERO,
            origin: Instant::now(),
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Register a resource and return its handle.
    pub fn register_resource(&mut self, resource: Resource) -> ResourceId {
        let id = ResourceId::from_index(self.resources.len());
        debug!("Registered resource '{}' as {}", resource.name, id);
        self.resources.push(resource);
        self.claims.push(None);
        id
    }

    /// Register a task and return its handle.
    ///
    /// Fails if the task requires a resource this scheduler does not know.
    pub fn add(
        &mut self,
        task: impl Task + 'static,
    ) -> std::result::Result<TaskId, ConstructionError> {
        if let Some(resource) = task
            .requirements()
            .iter()
            .find(|r| r.index() >= self.resources.len())
        {
            return Err(ConstructionError::UnknownResource {
                resource,
                task: task.name().to_string(),
            });
        }

        let id = TaskId::from_index(self.tasks.len());
        debug!("Registered task '{}' as {}", task.name(), id);
        self.tasks.push(Box::new(task));
        self.states.push(TaskState::Idle);
        Ok(id)
    }

    /// Add an observer notified of lifecycle transitions.
    pub fn add_observer(&mut self, observer: impl SchedulerObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Set or clear the default task of a resource.
    ///
    /// Setting a task while one is already set is an error. Clearing
    /// cancels the previous default if it is active.
    pub fn set_default_task(&mut self, resource: ResourceId, task: Option<TaskId>) -> Result<()> {
        self.ensure_resource(resource)?;
        if let Some(id) = task {
            self.ensure_task(id)?;
            if !self.tasks[id.index()].requirements().contains(resource) {
                return Err(
                    ConstructionError::DefaultTaskMissingRequirement { resource, task: id }.into(),
                );
            }
        }

        let previous = self.resources[resource.index()].set_default_task(resource, task)?;
        if let Some(old) = previous {
            debug!("Cleared default task {} of {}", old, resource);
            if self.is_active(old) {
                self.cancel(old)?;
            }
        }
        Ok(())
    }

    /// Schedule a task now, interrupting anything that holds its resources.
    ///
    /// Scheduling an active task does nothing.
    pub fn schedule(&mut self, id: TaskId) -> Result<()> {
        self.ensure_task(id)?;
        if self.is_active(id) {
            return Ok(());
        }

        let requirements: Vec<ResourceId> = self.tasks[id.index()].requirements().iter().collect();
        for resource in &requirements {
            if let Some(holder) = self.claims[resource.index()] {
                debug!(
                    "Task '{}' takes {} from '{}'",
                    self.tasks[id.index()].name(),
                    resource,
                    self.tasks[holder.index()].name()
                );
                self.interrupt(holder);
            }
        }

        for resource in &requirements {
            self.claims[resource.index()] = Some(id);
        }
        self.states[id.index()] = TaskState::Scheduled;
        self.active.push(id);
        debug!("Scheduled task '{}'", self.tasks[id.index()].name());
        Ok(())
    }

    /// Interrupt an active task and release its resources.
    ///
    /// Canceling an inactive task does nothing beyond dropping any queued
    /// schedule request for it.
    pub fn cancel(&mut self, id: TaskId) -> Result<()> {
        self.ensure_task(id)?;
        self.pending.retain(|r| *r != Request::Schedule(id));
        if self.is_active(id) {
            self.interrupt(id);
        }
        Ok(())
    }

    /// Interrupt every active task.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
        for id in self.active.clone() {
            if self.is_active(id) {
                self.interrupt(id);
            }
        }
    }

    /// Run one cycle.
    pub fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();
        self.now = match self.config.time_source {
            TimeSource::Simulated => self.config.period.saturating_mul(self.cycle_factor()),
            TimeSource::Wall => self.origin.elapsed(),
        };
        self.report = CycleReport {
            cycle: self.cycle,
            ..CycleReport::default()
        };
        trace!("Starting cycle {} at {:?}", self.cycle, self.now);

        // 1. Deferred requests
        for request in std::mem::take(&mut self.pending) {
            let id = request.task();
            let result = match request {
                Request::Schedule(_) => self.schedule(id),
                Request::Cancel(_) => self.cancel(id),
            };
            if let Err(e) = result {
                warn!("Dropping deferred request for {}: {}", id, e);
            }
        }

        // 2. Events
        self.poll_bindings();

        // 3. Initialize
        for id in self.active.clone() {
            if self.state(id) == TaskState::Scheduled {
                self.initialize_task(id);
            }
        }

        // 4. Execute
        for id in self.active.clone() {
            if self.state(id) == TaskState::Running {
                self.execute_task(id);
            }
        }

        // 5. Default fill-in
        self.fill_defaults();

        self.report.elapsed = started.elapsed();
        if self.config.warn_on_overrun && self.report.elapsed > self.config.period {
            warn!(
                "Loop overrun: cycle {} took {:?}, period is {:?}",
                self.cycle, self.report.elapsed, self.config.period
            );
        }
        trace!(
            "Cycle {} done: {} initialized, {} executed, {} finished, {} interrupted",
            self.cycle,
            self.report.initialized,
            self.report.executed,
            self.report.finished,
            self.report.interrupted
        );

        self.cycle += 1;
        self.report.clone()
    }

    /// Run `cycles` cycles back to back.
    pub fn run_cycles(&mut self, cycles: u64) {
        info!("Running {} cycles from cycle {}", cycles, self.cycle);
        for _ in 0..cycles {
            self.run_cycle();
        }
    }

    /// Current state of a task. Unknown handles read as idle.
    pub fn state(&self, id: TaskId) -> TaskState {
        self.states.get(id.index()).copied().unwrap_or_default()
    }

    /// Whether a task is scheduled or running.
    pub fn is_active(&self, id: TaskId) -> bool {
        self.state(id).is_active()
    }

    /// Task currently holding a resource.
    pub fn claimant(&self, resource: ResourceId) -> Option<TaskId> {
        self.claims.get(resource.index()).copied().flatten()
    }

    /// Default task of a resource.
    pub fn default_task(&self, resource: ResourceId) -> Option<TaskId> {
        self.resources
            .get(resource.index())
            .and_then(Resource::default_task)
    }

    /// A registered resource.
    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.index())
    }

    /// Name of a registered task.
    pub fn task_name(&self, id: TaskId) -> Option<&str> {
        self.tasks.get(id.index()).map(|t| t.name())
    }

    /// Active tasks in schedule order.
    pub fn active_tasks(&self) -> Vec<TaskId> {
        self.active.clone()
    }

    /// Index of the next cycle to run.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Clock value of the most recent cycle.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub(crate) fn ensure_task(&self, id: TaskId) -> Result<()> {
        if id.index() < self.tasks.len() {
            Ok(())
        } else {
            Err(SchedulerError::UnknownTask(id))
        }
    }

    fn ensure_resource(&self, id: ResourceId) -> Result<()> {
        if id.index() < self.resources.len() {
            Ok(())
        } else {
            Err(SchedulerError::UnknownResource(id))
        }
    }

    fn cycle_factor(&self) -> u32 {
        u32::try_from(self.cycle).unwrap_or(u32::MAX)
    }

    fn poll_bindings(&mut self) {
        for index in 0..self.bindings.len() {
            let Some(reaction) = self.bindings[index].poll() else {
                continue;
            };
            let result = match reaction {
                Reaction::Schedule(id) => self.schedule(id),
                Reaction::Cancel(id) => self.cancel(id),
                Reaction::Toggle(id) if self.is_active(id) => self.cancel(id),
                Reaction::Toggle(id) => self.schedule(id),
            };
            if let Err(e) = result {
                warn!("Binding {} failed: {}", index, e);
            }
        }
    }

    fn fill_defaults(&mut self) {
        for index in 0..self.resources.len() {
            if self.claims[index].is_some() {
                continue;
            }
            let Some(id) = self.resources[index].default_task() else {
                continue;
            };
            if self.is_active(id) {
                continue;
            }

            trace!(
                "Filling {} with default task '{}'",
                ResourceId::from_index(index),
                self.tasks[id.index()].name()
            );
            if let Err(e) = self.schedule(id) {
                warn!("Default task {} could not be scheduled: {}", id, e);
                continue;
            }
            self.report.defaults_started += 1;
            self.initialize_task(id);
            if self.state(id) == TaskState::Running {
                self.execute_task(id);
            }
        }
    }

    /// Run a callback on one task with a fresh context, then apply any
    /// cancel requests it raised.
    fn with_context<R>(
        &mut self,
        id: TaskId,
        f: impl FnOnce(&mut Box<dyn Task>, &mut TaskContext<'_>) -> R,
    ) -> R {
        let mark = self.pending.len();
        let result = {
            let task = &mut self.tasks[id.index()];
            let mut ctx = TaskContext::new(self.now, self.cycle, &self.states, &mut self.pending);
            f(task, &mut ctx)
        };
        self.apply_requests(mark);
        result
    }

    fn apply_requests(&mut self, mark: usize) {
        if self.pending.len() <= mark {
            return;
        }
        for request in self.pending.split_off(mark) {
            match request {
                Request::Schedule(_) => self.pending.push(request),
                Request::Cancel(id) => {
                    if let Err(e) = self.cancel(id) {
                        warn!("Dropping cancel request: {}", e);
                    }
                }
            }
        }
    }

    fn initialize_task(&mut self, id: TaskId) {
        debug!("Initializing task '{}'", self.tasks[id.index()].name());
        self.with_context(id, |task, ctx| task.initialize(ctx));
        self.report.initialized += 1;
        self.notify(id, Lifecycle::Initialized);

        if self.state(id) == TaskState::Scheduled {
            self.states[id.index()] = TaskState::Running;
        }
    }

    fn execute_task(&mut self, id: TaskId) {
        self.with_context(id, |task, ctx| task.execute(ctx));
        self.report.executed += 1;
        self.notify(id, Lifecycle::Executed);

        if self.state(id) != TaskState::Running {
            return;
        }
        let finished = self.with_context(id, |task, ctx| task.is_finished(ctx));
        if finished {
            self.finish(id);
        }
    }

    fn finish(&mut self, id: TaskId) {
        debug!("Task '{}' finished", self.tasks[id.index()].name());
        self.states[id.index()] = TaskState::Ending;
        self.with_context(id, |task, ctx| task.end(false, ctx));
        self.release(id);
        self.report.finished += 1;
        self.notify(id, Lifecycle::Finished);
    }

    fn interrupt(&mut self, id: TaskId) {
        debug!("Interrupting task '{}'", self.tasks[id.index()].name());
        self.states[id.index()] = TaskState::Ending;
        self.with_context(id, |task, ctx| task.end(true, ctx));
        self.release(id);
        self.report.interrupted += 1;
        self.notify(id, Lifecycle::Interrupted);
    }

    fn release(&mut self, id: TaskId) {
        for claim in self.claims.iter_mut() {
            if *claim == Some(id) {
                *claim = None;
            }
        }
        self.active.retain(|&a| a != id);
        self.states[id.index()] = TaskState::Idle;
    }

    fn notify(&mut self, id: TaskId, event: Lifecycle) {
        if self.observers.is_empty() {
            return;
        }
        let task = &self.tasks[id.index()];
        let info = TaskInfo {
            id,
            name: task.name(),
            requirements: task.requirements(),
        };
        for observer in self.observers.iter_mut() {
            match event {
                Lifecycle::Initialized => observer.on_task_initialized(info),
                Lifecycle::Executed => observer.on_task_executed(info),
                Lifecycle::Finished => observer.on_task_finished(info),
                Lifecycle::Interrupted => observer.on_task_interrupted(info),
            }
        }
    }
}
