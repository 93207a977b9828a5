//! Repetition.

use interlock_core::{ConstructionError, ResourceSet, Task, TaskContext};
use tracing::trace;

/// Restarts its child every time the child finishes. Never finishes itself.
pub struct Repeat {
    name: String,
    child: Box<dyn Task>,
    restart: bool,
    iterations: u64,
}

impl Repeat {
    /// Wrap `child`. Rejected when the child's tree contains a proxy.
    pub fn new(child: Box<dyn Task>) -> Result<Self, ConstructionError> {
        if child.contains_proxy() {
            return Err(ConstructionError::RepeatedProxy {
                task: child.name().to_string(),
            });
        }

        Ok(Self {
            name: format!("Repeat({})", child.name()),
            child,
            restart: false,
            iterations: 0,
        })
    }

    /// Completed runs of the child since the last initialize.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

impl Task for Repeat {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &ResourceSet {
        self.child.requirements()
    }

    fn initialize(&mut self, ctx: &mut TaskContext<'_>) {
        self.restart = false;
        self.iterations = 0;
        self.child.initialize(ctx);
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) {
        if self.restart {
            self.restart = false;
            self.child.initialize(ctx);
        }

        self.child.execute(ctx);
        if self.child.is_finished(ctx) {
            self.child.end(false, ctx);
            self.iterations += 1;
            self.restart = true;
            trace!("{} completed iteration {}", self.name, self.iterations);
        }
    }

    fn end(&mut self, interrupted: bool, ctx: &mut TaskContext<'_>) {
        if !self.restart {
            self.child.end(interrupted, ctx);
        }
        self.restart = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entries, rid, Harness, Log, Probe};
    use crate::Proxy;
    use interlock_core::TaskId;

    #[test]
    fn test_repeat_restarts_child() {
        let log = Log::default();
        let mut repeat = Repeat::new(Probe::new("a", rid(0), &log).finish_after(1).boxed()).unwrap();
        let mut harness = Harness::new();

        harness.start(&mut repeat);
        for _ in 0..3 {
            assert!(!harness.step(&mut repeat));
        }
        assert_eq!(repeat.iterations(), 3);
        assert_eq!(repeat.name(), "Repeat(a)");

        assert_eq!(
            entries(&log),
            vec![
                "a:init", "a:exec", "a:end", "a:init", "a:exec", "a:end", "a:init", "a:exec",
                "a:end"
            ]
        );
    }

    #[test]
    fn test_interrupt_between_iterations_skips_end() {
        let log = Log::default();
        let mut repeat = Repeat::new(Probe::new("a", rid(0), &log).finish_after(1).boxed()).unwrap();
        let mut harness = Harness::new();

        harness.start(&mut repeat);
        harness.step(&mut repeat);
        harness.interrupt(&mut repeat);

        assert_eq!(entries(&log), vec!["a:init", "a:exec", "a:end"]);
    }

    #[test]
    fn test_repeat_rejects_proxy() {
        let proxy = Proxy::new(TaskId::from_index(0), "inner");
        let result = Repeat::new(Box::new(proxy));

        assert!(matches!(result, Err(ConstructionError::RepeatedProxy { .. })));
    }
}
