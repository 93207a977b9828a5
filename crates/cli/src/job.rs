//! Running scenarios as one job.

use crate::scenario::{Bench, Scenario};
use clap::ValueEnum;
use interlock_core::{run_once, ResourceSet, Task, TaskId};
use interlock_execution::{CycleReport, SchedulerError};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// How the scenarios of a job are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStyle {
    /// Event-linked chain; one cycle between steps
    Chained,
    /// Proxied sequence; two cycles between steps
    Disjoint,
}

/// A job registered with the bench's scheduler.
pub struct Job {
    entry: TaskId,
    done: Rc<Cell<bool>>,
    /// Scenarios that failed to build, with the reason
    pub skipped: Vec<String>,
}

impl Job {
    /// Whether the last step has run.
    pub fn is_done(&self) -> bool {
        self.done.get()
    }
}

fn note(bench: &Bench, text: String) -> Box<dyn Task> {
    let trace = bench.trace.clone();
    Box::new(run_once(
        format!("Note({})", text),
        ResourceSet::new(),
        move || trace.note(text.clone()),
    ))
}

/// Build every scenario and link them, bracketed by `START`/`END` notes.
///
/// Scenarios rejected at construction are replaced by a `SKIPPED` note.
pub fn assemble(
    bench: &mut Bench,
    scenarios: &[&Scenario],
    style: JobStyle,
) -> Result<Job, SchedulerError> {
    let mut steps = Vec::new();
    let mut skipped = Vec::new();

    for scenario in scenarios {
        match scenario.build(bench) {
            Ok(task) => {
                steps.push(note(bench, format!("START {}", scenario.name)));
                steps.push(task);
                steps.push(note(bench, format!("END {}", scenario.name)));
            }
            Err(e) => {
                warn!("Skipping scenario '{}': {}", scenario.name, e);
                steps.push(note(bench, format!("SKIPPED {} - {}", scenario.name, e)));
                skipped.push(format!("{}: {}", scenario.name, e));
            }
        }
    }

    let done = Rc::new(Cell::new(false));
    let flag = done.clone();
    steps.push(Box::new(run_once("JobDone", ResourceSet::new(), move || flag.set(true))));

    let entry = match style {
        JobStyle::Chained => bench.scheduler.chain(steps)?,
        JobStyle::Disjoint => {
            let sequence = bench.scheduler.disjoint_sequence(steps)?;
            bench.scheduler.add(sequence)?
        }
    };
    info!("Assembled {:?} job of {} scenarios", style, scenarios.len());

    Ok(Job {
        entry,
        done,
        skipped,
    })
}

/// Totals over every cycle of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Cycles run
    pub cycles: u64,
    /// Whether the job reached its last step
    pub completed: bool,
    /// Tasks initialized
    pub initialized: usize,
    /// Task executions
    pub executed: usize,
    /// Tasks that finished on their own
    pub finished: usize,
    /// Tasks interrupted or canceled
    pub interrupted: usize,
    /// Default tasks started by fill-in
    pub defaults_started: usize,
}

impl RunSummary {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        self.initialized += report.initialized;
        self.executed += report.executed;
        self.finished += report.finished;
        self.interrupted += report.interrupted;
        self.defaults_started += report.defaults_started;
    }
}

/// Run `job` until it completes or `max_cycles` is reached.
///
/// With `realtime`, cycles are paced at the scheduler period and late
/// ticks are skipped. Otherwise cycles run back to back.
pub async fn run(
    bench: &mut Bench,
    job: &Job,
    max_cycles: u64,
    realtime: bool,
) -> Result<RunSummary, SchedulerError> {
    bench.arm_defaults()?;
    bench.scheduler.schedule(job.entry)?;

    let mut ticker = realtime.then(|| {
        let mut ticker = interval(bench.scheduler.config().period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    let mut summary = RunSummary::default();
    while summary.cycles < max_cycles {
        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }
        let report = bench.scheduler.run_cycle();
        bench.trace.end_cycle();
        summary.record(&report);

        if job.is_done() {
            summary.completed = true;
            break;
        }
    }

    if !summary.completed {
        warn!("Job did not finish within {} cycles", max_cycles);
        bench.scheduler.cancel_all();
    }
    bench.disarm_defaults()?;
    info!("Completed {} cycles", summary.cycles);

    Ok(summary)
}
