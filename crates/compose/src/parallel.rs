//! Parallel composition and the shared-requirement check.

use interlock_core::{ConstructionError, ResourceSet, Task, TaskContext};

/// Check that no two tasks share a requirement and return their union.
///
/// Tasks are checked as given: a proxy contributes its own empty set, so
/// proxied children never collide here.
pub fn ensure_disjoint(tasks: &[Box<dyn Task>]) -> Result<ResourceSet, ConstructionError> {
    let mut union = ResourceSet::new();

    for (i, task) in tasks.iter().enumerate() {
        if let Some(resource) = union.first_shared(task.requirements()) {
            let first = tasks[..i]
                .iter()
                .find(|t| t.requirements().contains(resource))
                .map(|t| t.name().to_string())
                .unwrap_or_default();
            return Err(ConstructionError::SharedRequirement {
                resource,
                first,
                second: task.name().to_string(),
            });
        }
        union.extend_from(task.requirements());
    }

    Ok(union)
}

/// Runs all children at once and finishes when every child has finished.
pub struct ParallelAll {
    name: String,
    children: Vec<Box<dyn Task>>,
    running: Vec<bool>,
    requirements: ResourceSet,
    contains_proxy: bool,
}

impl ParallelAll {
    /// Create a parallel group. Fails if two children share a resource.
    pub fn new(children: Vec<Box<dyn Task>>) -> Result<Self, ConstructionError> {
        let requirements = ensure_disjoint(&children)?;
        let contains_proxy = children.iter().any(|c| c.contains_proxy());

        Ok(Self {
            name: "ParallelAll".to_string(),
            running: vec![false; children.len()],
            children,
            requirements,
            contains_proxy,
        })
    }

    /// Number of children still running.
    pub fn running(&self) -> usize {
        self.running.iter().filter(|&&r| r).count()
    }
}

impl Task for ParallelAll {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            child.initialize(ctx);
            *running = true;
        }
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) {
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            if !*running {
                continue;
            }
            child.execute(ctx);
            if child.is_finished(ctx) {
                child.end(false, ctx);
                *running = false;
            }
        }
    }

    fn is_finished(&self, _ctx: &TaskContext<'_>) -> bool {
        !self.running.contains(&true)
    }

    fn end(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            if *running {
                child.end(interrupted, ctx);
                *running = false;
            }
        }
    }

    fn contains_proxy(&self) -> bool {
        self.contains_proxy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entries, rid, Harness, Log, Probe};

    #[test]
    fn test_shared_requirement_is_rejected() {
        let log = Log::default();
        let result = ParallelAll::new(vec![
            Probe::new("a", rid(0), &log).boxed(),
            Probe::new("b", rid(1), &log).boxed(),
            Probe::new("c", rid(0), &log).boxed(),
        ]);

        match result {
            Err(ConstructionError::SharedRequirement { resource, first, second }) => {
                assert_eq!(resource, rid(0));
                assert_eq!(first, "a");
                assert_eq!(second, "c");
            }
            other => panic!("expected shared requirement error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_parallel_waits_for_all() {
        let log = Log::default();
        let mut group = ParallelAll::new(vec![
            Probe::new("a", rid(0), &log).finish_after(1).boxed(),
            Probe::new("b", rid(1), &log).finish_after(3).boxed(),
        ])
        .unwrap();
        let mut harness = Harness::new();

        harness.start(&mut group);
        assert!(!harness.step(&mut group));
        assert_eq!(group.running(), 1);
        assert!(!harness.step(&mut group));
        assert!(harness.step(&mut group));

        let log = entries(&log);
        assert_eq!(log.iter().filter(|e| *e == "a:exec").count(), 1);
        assert_eq!(log.iter().filter(|e| *e == "b:exec").count(), 3);
        assert!(!log.iter().any(|e| e.ends_with("interrupted")));
    }

    #[test]
    fn test_parallel_interrupt_reaches_running_children() {
        let log = Log::default();
        let mut group = ParallelAll::new(vec![
            Probe::new("a", rid(0), &log).finish_after(1).boxed(),
            Probe::new("b", rid(1), &log).boxed(),
        ])
        .unwrap();
        let mut harness = Harness::new();

        harness.start(&mut group);
        harness.step(&mut group);
        harness.interrupt(&mut group);

        let log = entries(&log);
        assert!(log.contains(&"a:end".to_string()));
        assert!(log.contains(&"b:interrupted".to_string()));
        assert!(!log.contains(&"a:interrupted".to_string()));
    }
}
