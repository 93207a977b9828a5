//! Scheduler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the scheduler clock comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeSource {
    /// Cycle index times the period. Deterministic.
    #[default]
    Simulated,
    /// Monotonic wall time since the scheduler was created.
    Wall,
}

/// Configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Nominal cycle period
    pub period: Duration,
    /// Clock tasks observe through their context
    pub time_source: TimeSource,
    /// Emit a warning when a cycle takes longer than `period`
    pub warn_on_overrun: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(20), // 50 Hz
            time_source: TimeSource::Simulated,
            warn_on_overrun: true,
        }
    }
}

impl SchedulerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cycle period.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Set the cycle period from a rate in hertz. Zero keeps the current period.
    pub fn with_rate_hz(mut self, hz: u32) -> Self {
        if hz > 0 {
            self.period = Duration::from_secs(1) / hz;
        }
        self
    }

    /// Set the clock.
    pub fn with_time_source(mut self, source: TimeSource) -> Self {
        self.time_source = source;
        self
    }

    /// Enable or disable loop-overrun warnings.
    pub fn with_overrun_warning(mut self, enabled: bool) -> Self {
        self.warn_on_overrun = enabled;
        self
    }
}
