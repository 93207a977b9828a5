//! Shared fixtures: a scheduler with three traced resources.

use crate::Scheduler;
use interlock_core::{Resource, Trace, TraceChannel};

pub(crate) struct Rig {
    pub(crate) scheduler: Scheduler,
    pub(crate) trace: Trace,
    pub(crate) a: TraceChannel,
    pub(crate) b: TraceChannel,
    pub(crate) c: TraceChannel,
}

impl Rig {
    /// Resources `A`, `B` and `C` without default tasks.
    pub(crate) fn new() -> Self {
        let mut scheduler = Scheduler::default();
        let trace = Trace::new();
        let a = trace.channel('A', scheduler.register_resource(Resource::new("A")));
        let b = trace.channel('B', scheduler.register_resource(Resource::new("B")));
        let c = trace.channel('C', scheduler.register_resource(Resource::new("C")));

        Self {
            scheduler,
            trace,
            a,
            b,
            c,
        }
    }

    /// Resources `A`, `B` and `C`, each with a default task writing `d`.
    pub(crate) fn with_defaults() -> Self {
        let mut rig = Self::new();
        for channel in [rig.a.clone(), rig.b.clone(), rig.c.clone()] {
            let id = rig.scheduler.add(channel.default_task()).unwrap();
            rig.scheduler
                .set_default_task(channel.resource(), Some(id))
                .unwrap();
        }
        rig
    }

    pub(crate) fn cycle(&mut self) {
        self.scheduler.run_cycle();
        self.trace.end_cycle();
    }

    pub(crate) fn run(&mut self, cycles: usize) {
        for _ in 0..cycles {
            self.cycle();
        }
    }
}
