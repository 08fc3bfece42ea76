//! Step-progression state machine.
//!
//! [`transition`] is a pure function of the instance, the incoming signal and
//! a [`TransitionContext`]. It mutates the instance in place and returns the
//! effects the driver must perform: publish events, schedule the next signal,
//! archive the instance. It never sleeps and never touches the store, so it
//! can be exercised without a clock.

use std::time::Duration;

use chrono::{DateTime, Utc};

use flowdeck_config::EngineConfig;

use crate::durations::DurationSource;
use crate::event::WorkflowEvent;
use crate::instance::{
    LogEntry, StepStatus, WorkflowInstance, WorkflowStatus, format_duration, percent,
};

/// Result summary stored on naturally completed workflows.
pub const COMPLETION_RESULTS: &str = "Workflow completed successfully";

/// Fixed delays of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTiming {
    /// Delay before the first step after creation or resume.
    pub initial_delay: Duration,
    /// Delay between a completed step and the next step entry.
    pub inter_step_delay: Duration,
    /// Average step duration, used only for the ETA estimate.
    pub mean_step: Duration,
}

impl SchedulerTiming {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            inter_step_delay: Duration::from_millis(config.inter_step_delay_ms),
            mean_step: Duration::from_millis((config.step_min_ms + config.step_max_ms) / 2),
        }
    }

    /// Rough total run time of a workflow with `steps` steps.
    pub fn estimate(&self, steps: usize) -> Duration {
        let steps = steps as u32;
        self.initial_delay + (self.mean_step + self.inter_step_delay) * steps
    }
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// What woke the scheduler up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Entry of a step (or finalization once every step is done).
    EnterStep,
    /// The running step's simulated work is over.
    StepElapsed,
}

/// A scheduler wake-up, tagged with the run epoch that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub epoch: u64,
    pub kind: SignalKind,
}

impl Signal {
    pub fn enter_step(epoch: u64) -> Self {
        Self {
            epoch,
            kind: SignalKind::EnterStep,
        }
    }

    pub fn step_elapsed(epoch: u64) -> Self {
        Self {
            epoch,
            kind: SignalKind::StepElapsed,
        }
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver an event to subscribers.
    Publish(WorkflowEvent),
    /// Deliver `signal` to this instance after `after`.
    Schedule { after: Duration, signal: Signal },
    /// Move the instance from the active set to history.
    Archive,
}

/// Inputs a transition may read besides the instance itself.
pub struct TransitionContext<'a> {
    pub durations: &'a dyn DurationSource,
    pub timing: &'a SchedulerTiming,
    pub now: DateTime<Utc>,
}

/// Advance `instance` in response to `signal`.
///
/// A non-running instance, or a signal from an older epoch, yields no
/// effects and leaves the instance untouched.
pub fn transition(
    instance: &mut WorkflowInstance,
    signal: Signal,
    ctx: &TransitionContext<'_>,
) -> Vec<Effect> {
    if signal.epoch != instance.epoch || instance.status != WorkflowStatus::Running {
        return Vec::new();
    }

    match signal.kind {
        SignalKind::EnterStep if instance.is_finished() => finalize(instance, ctx),
        SignalKind::EnterStep => start_step(instance, signal.epoch, ctx),
        SignalKind::StepElapsed => complete_step(instance, signal.epoch, ctx),
    }
}

fn start_step(instance: &mut WorkflowInstance, epoch: u64, ctx: &TransitionContext<'_>) -> Vec<Effect> {
    let index = instance.current_step_index;
    let total = instance.steps.len();
    let step = &mut instance.steps[index];
    step.status = StepStatus::Running;
    let (name, agent) = (step.name.clone(), step.agent.clone());

    instance.current_step = Some(name.clone());
    instance.progress = instance.progress.max(percent(index as f64 + 0.5, total));
    instance.logs.push(LogEntry {
        timestamp: ctx.now,
        step_label: step_label(index, &name),
        agent,
        status: StepStatus::Running,
        message: format!("Started {}...", name.to_lowercase()),
    });

    vec![
        Effect::Publish(WorkflowEvent::WorkflowStepStarted {
            workflow_id: instance.id.clone(),
            step_index: index,
            step_name: name,
        }),
        Effect::Schedule {
            after: ctx.durations.step_duration(),
            signal: Signal::step_elapsed(epoch),
        },
    ]
}

fn complete_step(
    instance: &mut WorkflowInstance,
    epoch: u64,
    ctx: &TransitionContext<'_>,
) -> Vec<Effect> {
    let index = instance.current_step_index;
    let total = instance.steps.len();
    let Some(step) = instance.steps.get_mut(index) else {
        return Vec::new();
    };
    if step.status != StepStatus::Running {
        return Vec::new();
    }
    step.status = StepStatus::Completed;
    step.duration = ctx.durations.duration_label();
    let (name, agent) = (step.name.clone(), step.agent.clone());

    instance.progress = instance.progress.max(percent(index as f64 + 1.0, total));
    instance.logs.push(LogEntry {
        timestamp: ctx.now,
        step_label: step_label(index, &name),
        agent,
        status: StepStatus::Completed,
        message: format!("{} completed successfully", name),
    });
    instance.current_step_index += 1;

    vec![
        Effect::Publish(WorkflowEvent::WorkflowStepCompleted {
            workflow_id: instance.id.clone(),
            step_index: index,
            step_name: name,
        }),
        Effect::Schedule {
            after: ctx.timing.inter_step_delay,
            signal: Signal::enter_step(epoch),
        },
    ]
}

fn finalize(instance: &mut WorkflowInstance, ctx: &TransitionContext<'_>) -> Vec<Effect> {
    let elapsed = (ctx.now - instance.started_at).to_std().unwrap_or_default();

    instance.status = WorkflowStatus::Completed;
    instance.progress = 100;
    instance.completed_at = Some(ctx.now);
    instance.duration = Some(format_duration(elapsed));
    instance.results = Some(COMPLETION_RESULTS.to_string());

    vec![
        Effect::Publish(WorkflowEvent::WorkflowCompleted {
            workflow_id: instance.id.clone(),
            workflow_name: instance.display_name().to_string(),
        }),
        Effect::Archive,
    ]
}

fn step_label(index: usize, name: &str) -> String {
    format!("{}. {}", index + 1, name)
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
