//! Interlock CLI - resource-trace demos for the cooperative scheduler.

mod job;
mod scenario;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use interlock_core::TraceLine;
use interlock_execution::{SchedulerConfig, TaskLog, TaskLogConfig, TimeSource};
use job::{JobStyle, RunSummary};
use scenario::{Bench, Scenario, SCENARIOS};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "interlock")]
#[command(about = "Cooperative task scheduler demos", long_about = None)]
struct Cli {
    /// Log scheduler internals at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List demo scenarios
    List,
    /// Run one scenario, or all of them as one job, and print the trace
    Demo {
        /// Scenario name, or "all"
        #[arg(default_value = "all")]
        scenario: String,
        /// Cycle rate
        #[arg(long, default_value = "50")]
        rate_hz: u32,
        /// Collapse repeated frames into "<frame> --- <n> times" lines
        #[arg(long)]
        compress: bool,
        /// Print a JSON report instead of the trace
        #[arg(long)]
        json: bool,
        /// Pace cycles on the wall clock
        #[arg(long)]
        realtime: bool,
        /// Log task lifecycle transitions and print run counts
        #[arg(long)]
        log_tasks: bool,
        /// Stop after this many cycles
        #[arg(long, default_value = "10000")]
        max_cycles: u64,
        /// How scenarios are linked into the job
        #[arg(long, value_enum, default_value_t = JobStyle::Chained)]
        job_style: JobStyle,
    },
}

#[derive(Serialize)]
struct DemoReport<'a> {
    scenarios: Vec<&'a str>,
    job_style: JobStyle,
    rate_hz: u32,
    summary: RunSummary,
    skipped: Vec<String>,
    lines: Vec<TraceLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_runs: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List => {
            println!("Scenarios ({})", SCENARIOS.len());
            for scenario in SCENARIOS {
                println!("  {:<28} {}", scenario.name, scenario.summary);
            }
            println!("  {:<28} every scenario above as one job", "all");
        }
        Commands::Demo {
            scenario,
            rate_hz,
            compress,
            json,
            realtime,
            log_tasks,
            max_cycles,
            job_style,
        } => {
            let selected: Vec<&Scenario> = if scenario == "all" {
                SCENARIOS.iter().collect()
            } else {
                let found = scenario::find(&scenario).ok_or_else(|| {
                    anyhow!("Unknown scenario '{}'; run `interlock list`", scenario)
                })?;
                vec![found]
            };

            let time_source = if realtime {
                TimeSource::Wall
            } else {
                TimeSource::Simulated
            };
            let config = SchedulerConfig::new()
                .with_rate_hz(rate_hz)
                .with_time_source(time_source)
                .with_overrun_warning(realtime);
            let mut bench = Bench::new(config)?;

            let task_log = log_tasks.then(|| {
                let config = bench
                    .default_names()
                    .into_iter()
                    .fold(TaskLogConfig::new(), |config, name| config.exclude(name));
                let log = TaskLog::new(config);
                bench.scheduler.add_observer(log.clone());
                log
            });

            let job = job::assemble(&mut bench, &selected, job_style)?;
            info!("Running {} scenario(s) at {} Hz", selected.len(), rate_hz);
            let summary = job::run(&mut bench, &job, max_cycles, realtime).await?;

            if json {
                let report = DemoReport {
                    scenarios: selected.iter().map(|s| s.name).collect(),
                    job_style,
                    rate_hz,
                    summary,
                    skipped: job.skipped,
                    lines: bench.trace.lines(),
                    task_runs: task_log.map(|log| log.summary()),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            let trace = if compress {
                bench.trace.render_compressed()
            } else {
                bench.trace.render()
            };
            println!("{}", trace.trim_end());

            if let Some(log) = task_log {
                println!();
                println!("Task runs");
                for line in log.summary() {
                    println!("  {}", line);
                }
            }

            println!();
            println!(
                "{} after {} cycles",
                if summary.completed { "Completed" } else { "Stopped" },
                summary.cycles
            );
        }
    }

    Ok(())
}
