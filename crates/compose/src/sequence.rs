//! Sequential composition.

use interlock_core::{ResourceSet, Task, TaskContext};
use tracing::trace;

/// Runs children one after another.
///
/// The sequence requires the union of every child's requirements for its
/// whole run, so no default task on any of those resources can run
/// between steps. Wrap children in proxies to release resources between
/// steps instead.
pub struct Sequence {
    name: String,
    children: Vec<Box<dyn Task>>,
    requirements: ResourceSet,
    index: usize,
    contains_proxy: bool,
}

impl Sequence {
    /// Create a sequence. An empty sequence finishes on its first cycle.
    pub fn new(children: Vec<Box<dyn Task>>) -> Self {
        let mut requirements = ResourceSet::new();
        for child in &children {
            requirements.extend_from(child.requirements());
        }
        let contains_proxy = children.iter().any(|c| c.contains_proxy());
        let index = children.len();

        Self {
            name: "Sequence".to_string(),
            children,
            requirements,
            index,
            contains_proxy,
        }
    }

    /// Index of the active child, if the sequence is mid-run.
    pub fn current(&self) -> Option<usize> {
        (self.index < self.children.len()).then_some(self.index)
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the sequence has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Task for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        self.index = 0;
        if let Some(first) = self.children.first_mut() {
            first.initialize(ctx);
        }
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) {
        let Some(child) = self.children.get_mut(self.index) else {
            return;
        };

        child.execute(ctx);
        if !child.is_finished(ctx) {
            return;
        }

        child.end(false, ctx);
        trace!("{} step {} '{}' finished", self.name, self.index, child.name());
        self.index += 1;

        if let Some(next) = self.children.get_mut(self.index) {
            next.initialize(ctx);
        }
    }

    fn is_finished(&self, _ctx: &TaskContext<'_>) -> bool {
        self.index >= self.children.len()
    }

    fn end(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        if interrupted {
            if let Some(child) = self.children.get_mut(self.index) {
                child.end(true, ctx);
            }
        }
        self.index = self.children.len();
    }

    fn contains_proxy(&self) -> bool {
        self.contains_proxy
    }
}
