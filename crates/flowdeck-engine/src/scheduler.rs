//! Timer-driven driver for the step state machine.
//!
//! One tokio task per run of an instance. The task sleeps for each delay the
//! machine asks for, then applies the next signal through
//! [`WorkflowStore::update_active`] so that the status check, the mutation
//! and any archival happen under the store lock.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tracing::{debug, error, info};

use crate::broadcaster::EventBroadcaster;
use crate::durations::DurationSource;
use crate::error::EngineError;
use crate::machine::{Effect, SchedulerTiming, Signal, TransitionContext, transition};
use crate::store::{StoreAction, WorkflowStore};

/// Drives active instances through their steps.
pub struct StepScheduler {
    store: Arc<dyn WorkflowStore>,
    broadcaster: Arc<EventBroadcaster>,
    durations: Arc<dyn DurationSource>,
    timing: SchedulerTiming,
}

impl StepScheduler {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        broadcaster: Arc<EventBroadcaster>,
        durations: Arc<dyn DurationSource>,
        timing: SchedulerTiming,
    ) -> Self {
        Self {
            store,
            broadcaster,
            durations,
            timing,
        }
    }

    pub fn timing(&self) -> &SchedulerTiming {
        &self.timing
    }

    /// Start a run of `workflow_id` at its current step after the initial delay.
    ///
    /// The task ends on its own once the instance completes, stops being
    /// active, stops running, or a newer epoch takes over.
    pub fn launch(self: &Arc<Self>, workflow_id: String, epoch: u64) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.drive(workflow_id, epoch).await })
    }

    async fn drive(&self, workflow_id: String, epoch: u64) {
        debug!("Scheduler run {} started for workflow {}", epoch, workflow_id);

        let mut next = Some((self.timing.initial_delay, Signal::enter_step(epoch)));
        while let Some((after, signal)) = next.take() {
            time::sleep(after).await;
            match self.step(&workflow_id, signal).await {
                Ok(scheduled) => next = scheduled,
                Err(e) => {
                    error!("Scheduler for workflow {} failed: {}", workflow_id, e);
                    return;
                }
            }
        }

        debug!("Scheduler run {} ended for workflow {}", epoch, workflow_id);
    }

    /// Apply one signal and perform its effects. Returns the next wake-up, if any.
    async fn step(
        &self,
        workflow_id: &str,
        signal: Signal,
    ) -> Result<Option<(Duration, Signal)>, EngineError> {
        let ctx = TransitionContext {
            durations: self.durations.as_ref(),
            timing: &self.timing,
            now: Utc::now(),
        };
        let mut effects = Vec::new();

        let outcome = self
            .store
            .update_active(workflow_id, &mut |instance| {
                effects = transition(instance, signal, &ctx);
                if effects.contains(&Effect::Archive) {
                    StoreAction::Archive
                } else {
                    StoreAction::Keep
                }
            })
            .await?;

        if outcome.is_none() {
            debug!("Workflow {} is no longer active, scheduler exiting", workflow_id);
            return Ok(None);
        }

        let mut next = None;
        for effect in effects {
            match effect {
                Effect::Publish(event) => {
                    self.broadcaster.publish(event);
                }
                Effect::Schedule { after, signal } => next = Some((after, signal)),
                Effect::Archive => info!("Workflow {} completed", workflow_id),
            }
        }
        Ok(next)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
