//! Sources for simulated step timings.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;

use flowdeck_config::EngineConfig;

/// Supplies how long a step runs and the duration label it reports.
pub trait DurationSource: Send + Sync {
    /// Wall-clock time a step stays `running`.
    fn step_duration(&self) -> Duration;

    /// Label stored on a step when it completes, e.g. `"42s"`.
    fn duration_label(&self) -> String;
}

/// Uniformly random durations within configured ranges.
#[derive(Debug, Clone)]
pub struct RandomDurations {
    step_ms: Range<u64>,
    label_secs: Range<u64>,
}

impl RandomDurations {
    /// Empty ranges are widened to a single value.
    pub fn new(step_ms: Range<u64>, label_secs: Range<u64>) -> Self {
        Self {
            step_ms: widen(step_ms),
            label_secs: widen(label_secs),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.step_min_ms..config.step_max_ms,
            config.label_min_secs..config.label_max_secs,
        )
    }
}

impl Default for RandomDurations {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

fn widen(range: Range<u64>) -> Range<u64> {
    if range.start < range.end {
        range
    } else {
        range.start..range.start + 1
    }
}

impl DurationSource for RandomDurations {
    fn step_duration(&self) -> Duration {
        Duration::from_millis(rand::thread_rng().gen_range(self.step_ms.clone()))
    }

    fn duration_label(&self) -> String {
        format!("{}s", rand::thread_rng().gen_range(self.label_secs.clone()))
    }
}

/// Deterministic durations, for tests and demos.
#[derive(Debug, Clone)]
pub struct FixedDurations {
    pub step: Duration,
    pub label_secs: u64,
}

impl FixedDurations {
    pub fn new(step: Duration, label_secs: u64) -> Self {
        Self { step, label_secs }
    }
}

impl DurationSource for FixedDurations {
    fn step_duration(&self) -> Duration {
        self.step
    }

    fn duration_label(&self) -> String {
        format!("{}s", self.label_secs)
    }
}
