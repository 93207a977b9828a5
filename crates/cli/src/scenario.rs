//! Demo scenarios over three traced resources.

use interlock_compose::{Deadline, ParallelAll, RaceAny, Sequence, TaskExt};
use interlock_core::{wait, Resource, ResourceId, Task, TaskId, Trace, TraceChannel};
use interlock_execution::{Scheduler, SchedulerConfig, SchedulerError};
use std::time::Duration;
use tracing::debug;

type Build = fn(&mut Bench) -> Result<Box<dyn Task>, SchedulerError>;

/// A named composition exercised against resources `A`, `B` and `C`.
pub struct Scenario {
    /// Name used on the command line
    pub name: &'static str,
    /// One-line description for `interlock list`
    pub summary: &'static str,
    build: Build,
}

impl Scenario {
    /// Build the scenario's top-level task on `bench`.
    pub fn build(&self, bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
        debug!("Building scenario '{}'", self.name);
        (self.build)(bench)
    }
}

/// Every scenario, in the order `all` runs them.
pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "sequence",
        summary: "A1, wait 0.1s, A2 as one sequence; A's default stays out until it ends",
        build: sequence,
    },
    Scenario {
        name: "disjoint-sequence",
        summary: "the same steps proxied; A's default runs during the wait",
        build: disjoint_sequence,
    },
    Scenario {
        name: "repeating-sequence",
        summary: "A1, B1, C1 (50ms each) repeated, bounded by a 0.5s timeout",
        build: repeating_sequence,
    },
    Scenario {
        name: "disjoint-repeating-sequence",
        summary: "repeating a proxied sequence; rejected at construction",
        build: disjoint_repeating_sequence,
    },
    Scenario {
        name: "parallel",
        summary: "nested parallel groups holding every resource they touch",
        build: parallel,
    },
    Scenario {
        name: "disjoint-parallel",
        summary: "the nested groups built with disjoint constructors",
        build: disjoint_parallel,
    },
    Scenario {
        name: "manual-disjoint-parallel",
        summary: "the nested groups with hand-placed proxies",
        build: manual_disjoint_parallel,
    },
    Scenario {
        name: "deadline",
        summary: "deadline on A1 + wait 0.2s; B and C stay held until it ends",
        build: deadline,
    },
    Scenario {
        name: "disjoint-deadline",
        summary: "the deadline with proxied sequences; defaults return early",
        build: disjoint_deadline,
    },
    Scenario {
        name: "race",
        summary: "race of proxied sequences; the first to finish stops the rest",
        build: race,
    },
    Scenario {
        name: "disjoint-race",
        summary: "the race built with the disjoint constructor",
        build: disjoint_race,
    },
];

/// Look up a scenario by name.
pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

/// Scheduler with resources `A`, `B` and `C` wired to one trace.
pub struct Bench {
    /// The scheduler under test
    pub scheduler: Scheduler,
    /// Shared trace recorder
    pub trace: Trace,
    /// Resource `A`
    pub a: TraceChannel,
    /// Resource `B`
    pub b: TraceChannel,
    /// Resource `C`
    pub c: TraceChannel,
    defaults: Vec<(ResourceId, TaskId)>,
}

impl Bench {
    /// Register the three resources and their default tasks.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let mut scheduler = Scheduler::new(config);
        let trace = Trace::new();
        let a = trace.channel('A', scheduler.register_resource(Resource::new("A")));
        let b = trace.channel('B', scheduler.register_resource(Resource::new("B")));
        let c = trace.channel('C', scheduler.register_resource(Resource::new("C")));

        let mut defaults = Vec::new();
        for channel in [&a, &b, &c] {
            let id = scheduler.add(channel.default_task())?;
            defaults.push((channel.resource(), id));
        }

        Ok(Self {
            scheduler,
            trace,
            a,
            b,
            c,
            defaults,
        })
    }

    /// Install the default tasks.
    pub fn arm_defaults(&mut self) -> Result<(), SchedulerError> {
        for &(resource, task) in &self.defaults {
            self.scheduler.set_default_task(resource, Some(task))?;
        }
        Ok(())
    }

    /// Remove the default tasks, canceling any that run.
    pub fn disarm_defaults(&mut self) -> Result<(), SchedulerError> {
        for &(resource, _) in &self.defaults {
            self.scheduler.set_default_task(resource, None)?;
        }
        Ok(())
    }

    /// Names of the default tasks.
    pub fn default_names(&self) -> Vec<String> {
        self.defaults
            .iter()
            .filter_map(|&(_, id)| self.scheduler.task_name(id).map(str::to_string))
            .collect()
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn steps(bench: &Bench) -> Vec<Box<dyn Task>> {
    vec![
        bench.a.test_duration(1, Duration::ZERO).boxed(),
        wait(ms(100)).boxed(),
        bench.a.test_duration(2, Duration::ZERO).boxed(),
    ]
}

fn cycle_abc(bench: &Bench) -> Vec<Box<dyn Task>> {
    vec![
        bench.a.test_duration(1, ms(50)).boxed(),
        bench.b.test_duration(1, ms(50)).boxed(),
        bench.c.test_duration(1, ms(50)).boxed(),
    ]
}

fn sequence(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    Ok(Sequence::new(steps(bench)).boxed())
}

fn disjoint_sequence(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    let children = steps(bench);
    Ok(bench.scheduler.disjoint_sequence(children)?.boxed())
}

fn repeating_sequence(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    Ok(Sequence::new(cycle_abc(bench))
        .repeatedly()?
        .with_timeout(ms(500))
        .boxed())
}

fn disjoint_repeating_sequence(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    let children = cycle_abc(bench);
    Ok(bench
        .scheduler
        .disjoint_sequence(children)?
        .repeatedly()?
        .with_timeout(ms(500))
        .boxed())
}

fn parallel(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    let inner = ParallelAll::new(vec![
        bench.a.test_duration(1, ms(840)).boxed(),
        bench.b.test_duration(2, ms(1000)).boxed(),
    ])?;
    let branch = Sequence::new(vec![bench.b.test_duration(1, ms(740)).boxed(), inner.boxed()]);

    Ok(ParallelAll::new(vec![branch.boxed(), bench.c.test_duration(1, ms(600)).boxed()])?.boxed())
}

fn disjoint_parallel(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    let (a1, b1) = (bench.a.test_duration(1, ms(840)), bench.b.test_duration(1, ms(1000)));
    let inner = bench.scheduler.disjoint_parallel_all(vec![a1.boxed(), b1.boxed()])?;
    let lead = bench.b.test_duration(1, ms(740));
    let branch = bench.scheduler.disjoint_sequence(vec![lead.boxed(), inner.boxed()])?;
    let c1 = bench.c.test_duration(1, ms(600));

    Ok(bench
        .scheduler
        .disjoint_parallel_all(vec![branch.boxed(), c1.boxed()])?
        .boxed())
}

fn manual_disjoint_parallel(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    let a1 = bench.scheduler.proxy(bench.a.test_duration(1, ms(840)))?;
    let b2 = bench.scheduler.proxy(bench.b.test_duration(2, ms(1000)))?;
    let b1 = bench.scheduler.proxy(bench.b.test_duration(1, ms(740)))?;
    let c1 = bench.scheduler.proxy(bench.c.test_duration(1, ms(600)))?;

    let inner = ParallelAll::new(vec![a1.boxed(), b2.boxed()])?;
    let branch = Sequence::new(vec![b1.boxed(), inner.boxed()]);
    Ok(ParallelAll::new(vec![branch.boxed(), c1.boxed()])?.boxed())
}

fn deadline(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    let primary = Sequence::new(vec![
        bench.a.test_duration(1, ms(100)).boxed(),
        wait(ms(200)).boxed(),
    ]);
    let others = vec![
        Sequence::new(vec![bench.b.test_duration(1, ms(120)).boxed()]).boxed(),
        Sequence::new(vec![bench.c.test_duration(1, ms(400)).boxed()]).boxed(),
    ];
    Ok(Deadline::new(primary.boxed(), others)?.boxed())
}

fn disjoint_deadline(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    let (a1, b1, c1) = (
        bench.a.test_duration(1, ms(100)),
        bench.b.test_duration(1, ms(120)),
        bench.c.test_duration(1, ms(400)),
    );
    let primary = bench.scheduler.disjoint_sequence(vec![a1.boxed(), wait(ms(200)).boxed()])?;
    let others = vec![
        bench.scheduler.disjoint_sequence(vec![b1.boxed()])?.boxed(),
        bench.scheduler.disjoint_sequence(vec![c1.boxed()])?.boxed(),
    ];
    Ok(bench
        .scheduler
        .disjoint_deadline(primary.boxed(), others)?
        .boxed())
}

fn racers(bench: &mut Bench) -> Result<Vec<Box<dyn Task>>, SchedulerError> {
    let (a1, b1, c1) = (
        bench.a.test_duration(1, ms(240)),
        bench.b.test_duration(1, ms(120)),
        bench.c.test_duration(1, ms(120)),
    );
    Ok(vec![
        bench.scheduler.disjoint_sequence(vec![a1.boxed()])?.boxed(),
        bench
            .scheduler
            .disjoint_sequence(vec![b1.boxed(), wait(ms(300)).boxed()])?
            .boxed(),
        bench
            .scheduler
            .disjoint_sequence(vec![c1.boxed(), wait(ms(300)).boxed()])?
            .boxed(),
    ])
}

fn race(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    let children = racers(bench)?;
    Ok(RaceAny::new(children)?.boxed())
}

fn disjoint_race(bench: &mut Bench) -> Result<Box<dyn Task>, SchedulerError> {
    let children = racers(bench)?;
    Ok(bench.scheduler.disjoint_race_any(children)?.boxed())
}
