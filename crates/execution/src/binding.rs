//! Edge-triggered event bindings.

use crate::error::Result;
use crate::scheduler::Scheduler;
use interlock_core::{Edge, EdgeDetector, Event, TaskId};

/// How a binding reacts to edges of its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Schedule the task on a rising edge.
    OnRising,
    /// Schedule the task on a falling edge.
    OnFalling,
    /// Schedule on a rising edge and cancel on a falling edge.
    WhileTrue,
    /// On a rising edge, cancel the task if active, otherwise schedule it.
    ToggleOnRising,
    /// Cancel the task on a rising edge.
    CancelOnRising,
}

/// What the scheduler should do after a binding is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reaction {
    Schedule(TaskId),
    Cancel(TaskId),
    Toggle(TaskId),
}

/// An event tied to a task through a [`Trigger`].
pub(crate) struct Binding {
    event: Event,
    trigger: Trigger,
    task: TaskId,
    detector: EdgeDetector,
}

impl Binding {
    pub(crate) fn new(event: Event, trigger: Trigger, task: TaskId) -> Self {
        Self {
            event,
            trigger,
            task,
            detector: EdgeDetector::new(),
        }
    }

    /// Sample the event once and decide the reaction, if any.
    pub(crate) fn poll(&mut self) -> Option<Reaction> {
        let edge = self.detector.update(self.event.sample());
        match (self.trigger, edge) {
            (Trigger::OnRising, Edge::Rising) => Some(Reaction::Schedule(self.task)),
            (Trigger::OnFalling, Edge::Falling) => Some(Reaction::Schedule(self.task)),
            (Trigger::WhileTrue, Edge::Rising) => Some(Reaction::Schedule(self.task)),
            (Trigger::WhileTrue, Edge::Falling) => Some(Reaction::Cancel(self.task)),
            (Trigger::ToggleOnRising, Edge::Rising) => Some(Reaction::Toggle(self.task)),
            (Trigger::CancelOnRising, Edge::Rising) => Some(Reaction::Cancel(self.task)),
            _ => None,
        }
    }
}

impl Scheduler {
    /// Bind `event` to `task`. The event is sampled once per cycle.
    pub fn bind(&mut self, event: Event, trigger: Trigger, task: TaskId) -> Result<()> {
        self.ensure_task(task)?;
        self.bindings.push(Binding::new(event, trigger, task));
        Ok(())
    }

    /// Schedule `task` whenever `event` becomes true.
    pub fn on_rising(&mut self, event: Event, task: TaskId) -> Result<()> {
        self.bind(event, Trigger::OnRising, task)
    }

    /// Schedule `task` whenever `event` becomes false.
    pub fn on_falling(&mut self, event: Event, task: TaskId) -> Result<()> {
        self.bind(event, Trigger::OnFalling, task)
    }

    /// Run `task` only while `event` holds.
    pub fn while_true(&mut self, event: Event, task: TaskId) -> Result<()> {
        self.bind(event, Trigger::WhileTrue, task)
    }

    /// Toggle `task` whenever `event` becomes true.
    pub fn toggle_on_rising(&mut self, event: Event, task: TaskId) -> Result<()> {
        self.bind(event, Trigger::ToggleOnRising, task)
    }

    /// Cancel `task` whenever `event` becomes true.
    pub fn cancel_on_rising(&mut self, event: Event, task: TaskId) -> Result<()> {
        self.bind(event, Trigger::CancelOnRising, task)
    }
}
