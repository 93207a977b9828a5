//! Race composition.

use crate::parallel::ensure_disjoint;
use interlock_core::{ConstructionError, ResourceSet, Task, TaskContext};
use tracing::trace;

/// Runs all children at once and finishes as soon as one of them does.
///
/// In the cycle the first child finishes, every other child still running
/// is ended with `interrupted = true`.
pub struct RaceAny {
    name: String,
    children: Vec<Box<dyn Task>>,
    running: Vec<bool>,
    requirements: ResourceSet,
    finished: bool,
    contains_proxy: bool,
}

impl RaceAny {
    /// Create a race. Fails if two children share a resource.
    pub fn new(children: Vec<Box<dyn Task>>) -> Result<Self, ConstructionError> {
        let requirements = ensure_disjoint(&children)?;
        let contains_proxy = children.iter().any(|c| c.contains_proxy());

        Ok(Self {
            name: "RaceAny".to_string(),
            running: vec![false; children.len()],
            children,
            requirements,
            finished: false,
            contains_proxy,
        })
    }

    fn stop_running(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        for (child, running) in self.children.iter_mut().zip(self.running.iter_mut()) {
            if *running {
                child.end(interrupted, ctx);
                *running = false;
            }
        }
    }
}

impl Task for RaceAny {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        self.finished = self.children.is_empty();
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
                if !self.finished {
                    trace!("{} won by '{}'", self.name, child.name());
                }
                self.finished = true;
            }
        }

        if self.finished {
            self.stop_running(true, ctx);
        }
    }

    fn is_finished(&self, _ctx: &TaskContext<'_>) -> bool {
        self.finished
    }

    fn end(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        self.stop_running(interrupted, ctx);
        self.finished = true;
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
    fn test_first_finisher_cancels_the_rest_same_cycle() {
        let log = Log::default();
        let mut race = RaceAny::new(vec![
            Probe::new("a", rid(0), &log).boxed(),
            Probe::new("b", rid(1), &log).finish_after(2).boxed(),
            Probe::new("c", rid(2), &log).boxed(),
        ])
        .unwrap();
        let mut harness = Harness::new();

        harness.start(&mut race);
        assert!(!harness.step(&mut race));
        log.borrow_mut().clear();
        assert!(harness.step(&mut race));

        assert_eq!(
            entries(&log),
            vec!["a:exec", "b:exec", "b:end", "c:exec", "a:interrupted", "c:interrupted"]
        );
    }

    #[test]
    fn test_race_rejects_shared_requirement() {
        let log = Log::default();
        let result = RaceAny::new(vec![
            Probe::new("a", rid(0), &log).boxed(),
            Probe::new("b", rid(0), &log).boxed(),
        ]);

        assert!(matches!(result, Err(ConstructionError::SharedRequirement { .. })));
    }
}
