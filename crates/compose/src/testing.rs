//! Helpers for driving composites without a scheduler.

use interlock_core::{Request, ResourceId, ResourceSet, Task, TaskContext, TaskState};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

pub(crate) fn rid(i: usize) -> ResourceId {
    ResourceId::from_index(i)
}

/// Leaf task that records its lifecycle and finishes after `n` executes.
pub(crate) struct Probe {
    name: String,
    requirements: ResourceSet,
    finish_after: Option<usize>,
    executes: usize,
    log: Log,
}

impl Probe {
    pub(crate) fn new(name: &str, requirements: impl Into<ResourceSet>, log: &Log) -> Self {
        Self {
            name: name.to_string(),
            requirements: requirements.into(),
            finish_after: None,
            executes: 0,
            log: log.clone(),
        }
    }

    pub(crate) fn finish_after(mut self, n: usize) -> Self {
        self.finish_after = Some(n);
        self
    }

    pub(crate) fn boxed(self) -> Box<dyn Task> {
        Box::new(self)
    }
}

impl Task for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self, _ctx: &mut TaskContext<'_>) {
        self.executes = 0;
        self.log.borrow_mut().push(format!("{}:init", self.name));
    }

    fn execute(&mut self, _ctx: &mut TaskContext<'_>) {
        self.executes += 1;
        self.log.borrow_mut().push(format!("{}:exec", self.name));
    }

    fn is_finished(&self, _ctx: &TaskContext<'_>) -> bool {
        self.finish_after.is_some_and(|n| self.executes >= n)
    }

    fn end(&mut self, interrupted: bool, _ctx: &mut TaskContext<'_>) {
        let suffix = if interrupted { "interrupted" } else { "end" };
        self.log.borrow_mut().push(format!("{}:{}", self.name, suffix));
    }
}

/// Drives one task through the cycle contract on a simulated clock.
pub(crate) struct Harness {
    pub(crate) now: Duration,
    pub(crate) cycle: u64,
    pub(crate) states: Vec<TaskState>,
    pub(crate) requests: Vec<Request>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            now: Duration::ZERO,
            cycle: 0,
            states: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub(crate) fn start(&mut self, task: &mut dyn Task) {
        let mut ctx = TaskContext::new(self.now, self.cycle, &self.states, &mut self.requests);
        task.initialize(&mut ctx);
    }

    /// Execute once; ends the task and returns true when it finishes.
    pub(crate) fn step(&mut self, task: &mut dyn Task) -> bool {
        let mut ctx = TaskContext::new(self.now, self.cycle, &self.states, &mut self.requests);
        task.execute(&mut ctx);
        let finished = task.is_finished(&ctx);
        if finished {
            task.end(false, &mut ctx);
        }
        self.cycle += 1;
        self.now += Duration::from_millis(20);
        finished
    }

    pub(crate) fn interrupt(&mut self, task: &mut dyn Task) {
        let mut ctx = TaskContext::new(self.now, self.cycle, &self.states, &mut self.requests);
        task.end(true, &mut ctx);
    }
}

pub(crate) fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}
