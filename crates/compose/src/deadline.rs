//! Deadline composition.

use crate::parallel::ensure_disjoint;
use interlock_core::{ConstructionError, ResourceSet, Task, TaskContext};

/// Runs a primary task alongside others and finishes with the primary.
///
/// When the primary finishes, every other child still running is ended
/// with `interrupted = true`. Others that finish earlier just stop; they
/// are not restarted and keep their resources claimed through the group.
pub struct Deadline {
    name: String,
    children: Vec<Box<dyn Task>>,
    running: Vec<bool>,
    requirements: ResourceSet,
    finished: bool,
    contains_proxy: bool,
}

impl Deadline {
    /// Create a deadline group. Fails if two children share a resource.
    pub fn new(
        primary: Box<dyn Task>,
        others: Vec<Box<dyn Task>>,
    ) -> Result<Self, ConstructionError> {
        let mut children = Vec::with_capacity(others.len() + 1);
        children.push(primary);
        children.extend(others);

        let requirements = ensure_disjoint(&children)?;
        let contains_proxy = children.iter().any(|c| c.contains_proxy());

        Ok(Self {
            name: "Deadline".to_string(),
            running: vec![false; children.len()],
            children,
            requirements,
            finished: false,
            contains_proxy,
        })
    }

    /// Whether the non-primary child at `index` is still running.
    pub fn is_other_running(&self, index: usize) -> bool {
        self.running.get(index + 1).copied().unwrap_or(false)
    }
}

impl Task for Deadline {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        self.finished = false;
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            child.initialize(ctx);
            *running = true;
        }
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) {
        for (i, (child, running)) in self
            .children
            .iter_mut()
            .zip(self.running.iter_mut())
            .enumerate()
        {
            if !*running {
                continue;
            }
            child.execute(ctx);
            if child.is_finished(ctx) {
                child.end(false, ctx);
                *running = false;
                if i == 0 {
                    self.finished = true;
                }
            }
        }

        if self.finished {
            for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
                if *running {
                    child.end(true, ctx);
                    *running = false;
                }
            }
        }
    }

    fn is_finished(&self, _ctx: &TaskContext<'_>) -> bool {
        self.finished
    }

    fn end(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            if *running {
                child.end(interrupted, ctx);
                *running = false;
            }
        }
        self.finished = true;
    }

    fn contains_proxy(&self) -> bool {
        self.contains_proxy
    }
}
