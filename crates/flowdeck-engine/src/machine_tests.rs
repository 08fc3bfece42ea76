//! Tests for the step-progression transition function.

use super::*;
use crate::durations::FixedDurations;
use crate::instance::RequestMeta;
use crate::template::{TemplateRegistry, WorkflowTemplate};

fn instance(template: &str) -> WorkflowInstance {
    let registry = TemplateRegistry::builtin();
    WorkflowInstance::from_template(
        "wf_0000abcd".to_string(),
        registry.lookup(template).unwrap(),
        RequestMeta::named("Demo"),
    )
}

fn durations() -> FixedDurations {
    FixedDurations::new(Duration::from_millis(4000), 42)
}

fn timing() -> SchedulerTiming {
    SchedulerTiming {
        initial_delay: Duration::from_millis(1000),
        inter_step_delay: Duration::from_millis(2000),
        mean_step: Duration::from_millis(5500),
    }
}

fn apply(instance: &mut WorkflowInstance, signal: Signal) -> Vec<Effect> {
    let durations = durations();
    let timing = timing();
    let ctx = TransitionContext {
        durations: &durations,
        timing: &timing,
        now: Utc::now(),
    };
    transition(instance, signal, &ctx)
}

#[test]
fn test_enter_step_starts_first_step() {
    let mut wf = instance("standard_process");
    let effects = apply(&mut wf, Signal::enter_step(0));

    assert_eq!(wf.steps[0].status, StepStatus::Running);
    assert_eq!(wf.current_step.as_deref(), Some("Planning"));
    assert_eq!(wf.progress, 13);
    assert_eq!(wf.logs.len(), 1);
    assert_eq!(wf.logs[0].step_label, "1. Planning");
    assert_eq!(wf.logs[0].message, "Started planning...");
    assert_eq!(wf.logs[0].status, StepStatus::Running);

    assert_eq!(
        effects,
        vec![
            Effect::Publish(WorkflowEvent::WorkflowStepStarted {
                workflow_id: "wf_0000abcd".to_string(),
                step_index: 0,
                step_name: "Planning".to_string(),
            }),
            Effect::Schedule {
                after: Duration::from_millis(4000),
                signal: Signal::step_elapsed(0),
            },
        ]
    );
}

#[test]
fn test_step_elapsed_completes_step() {
    let mut wf = instance("standard_process");
    apply(&mut wf, Signal::enter_step(0));
    let effects = apply(&mut wf, Signal::step_elapsed(0));

    assert_eq!(wf.steps[0].status, StepStatus::Completed);
    assert_eq!(wf.steps[0].duration, "42s");
    assert_eq!(wf.progress, 25);
    assert_eq!(wf.current_step_index, 1);
    assert_eq!(wf.logs[1].message, "Planning completed successfully");
    assert_eq!(wf.logs[1].status, StepStatus::Completed);

    assert!(matches!(
        &effects[0],
        Effect::Publish(WorkflowEvent::WorkflowStepCompleted { step_index: 0, .. })
    ));
    assert_eq!(
        effects[1],
        Effect::Schedule {
            after: Duration::from_millis(2000),
            signal: Signal::enter_step(0),
        }
    );
}

#[test]
fn test_full_run_completes_and_archives() {
    let mut wf = instance("standard_process");
    let mut last_progress = 0;
    let mut signal = Some(Signal::enter_step(0));
    let mut published = Vec::new();
    let mut archived = false;

    while let Some(current) = signal.take() {
        for effect in apply(&mut wf, current) {
            match effect {
                Effect::Publish(event) => published.push(event.kind()),
                Effect::Schedule { signal: next, .. } => signal = Some(next),
                Effect::Archive => archived = true,
            }
        }
        assert!(wf.progress >= last_progress);
        last_progress = wf.progress;

        // No later step completes before an earlier one.
        let first_open = wf
            .steps
            .iter()
            .position(|s| s.status != StepStatus::Completed)
            .unwrap_or(wf.steps.len());
        assert!(wf.steps[first_open..]
            .iter()
            .all(|s| s.status != StepStatus::Completed));
        assert!(wf.steps.iter().filter(|s| s.status == StepStatus::Running).count() <= 1);
    }

    assert!(archived);
    assert_eq!(wf.status, WorkflowStatus::Completed);
    assert_eq!(wf.progress, 100);
    assert!(wf.completed_at.is_some());
    assert_eq!(wf.results.as_deref(), Some(COMPLETION_RESULTS));
    assert!(wf.duration.is_some());
    assert_eq!(wf.logs.len(), 8);
    assert_eq!(published.len(), 9);
    assert_eq!(published.last().copied(), Some("workflow_completed"));
}

#[test]
fn test_progress_percentages_for_three_steps() {
    let template = WorkflowTemplate::new(
        "triple",
        "Triple",
        vec!["A".into(), "B".into(), "C".into()],
        vec!["X".into(), "Y".into(), "Z".into()],
    )
    .unwrap();
    let mut wf =
        WorkflowInstance::from_template("wf_0000beef".to_string(), &template, RequestMeta::default());
    let expected = [(17, 33), (50, 67), (83, 100)];
    for (started, completed) in expected {
        apply(&mut wf, Signal::enter_step(0));
        assert_eq!(wf.progress, started);
        apply(&mut wf, Signal::step_elapsed(0));
        assert_eq!(wf.progress, completed);
    }
}

#[test]
fn test_paused_instance_ignores_signals() {
    let mut wf = instance("standard_process");
    apply(&mut wf, Signal::enter_step(0));
    wf.status = WorkflowStatus::Paused;
    let before = wf.clone();

    assert!(apply(&mut wf, Signal::step_elapsed(0)).is_empty());
    assert!(apply(&mut wf, Signal::enter_step(0)).is_empty());
    assert_eq!(wf, before);
}

#[test]
fn test_stale_epoch_is_ignored() {
    let mut wf = instance("standard_process");
    wf.epoch = 1;
    let before = wf.clone();

    assert!(apply(&mut wf, Signal::enter_step(0)).is_empty());
    assert_eq!(wf, before);
    assert!(!apply(&mut wf, Signal::enter_step(1)).is_empty());
}

#[test]
fn test_step_elapsed_without_running_step_is_noop() {
    let mut wf = instance("standard_process");
    assert!(apply(&mut wf, Signal::step_elapsed(0)).is_empty());
    assert_eq!(wf.steps[0].status, StepStatus::Pending);
    assert_eq!(wf.current_step_index, 0);
}

#[test]
fn test_reentering_a_step_never_lowers_progress() {
    let mut wf = instance("standard_process");
    apply(&mut wf, Signal::enter_step(0));
    wf.progress = 20;
    apply(&mut wf, Signal::enter_step(0));
    assert_eq!(wf.progress, 20);
    assert_eq!(wf.steps[0].status, StepStatus::Running);
}

#[test]
fn test_timing_from_config_and_estimate() {
    let timing = SchedulerTiming::default();
    assert_eq!(timing.initial_delay, Duration::from_millis(1000));
    assert_eq!(timing.inter_step_delay, Duration::from_millis(2000));
    assert_eq!(timing.mean_step, Duration::from_millis(5500));
    assert_eq!(timing.estimate(4), Duration::from_millis(1000 + 4 * 7500));
    assert_eq!(timing.estimate(0), Duration::from_millis(1000));
}
