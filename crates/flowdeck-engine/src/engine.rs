//! Engine facade: the operations the HTTP layer calls.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use flowdeck_config::Config;

use crate::broadcaster::EventBroadcaster;
use crate::durations::{DurationSource, RandomDurations};
use crate::error::EngineError;
use crate::event::WorkflowEvent;
use crate::instance::{
    RequestMeta, WorkflowInstance, WorkflowStatus, WorkflowSummary, format_duration,
};
use crate::machine::SchedulerTiming;
use crate::scheduler::StepScheduler;
use crate::store::{MemoryWorkflowStore, StoreAction, StoreCounts, WorkflowStore};
use crate::template::TemplateRegistry;

/// Workflow engine: template catalog, instance store, scheduler and broadcaster.
pub struct WorkflowEngine {
    registry: TemplateRegistry,
    store: Arc<dyn WorkflowStore>,
    broadcaster: Arc<EventBroadcaster>,
    scheduler: Arc<StepScheduler>,
}

impl WorkflowEngine {
    pub fn new(
        registry: TemplateRegistry,
        store: Arc<dyn WorkflowStore>,
        broadcaster: Arc<EventBroadcaster>,
        durations: Arc<dyn DurationSource>,
        timing: SchedulerTiming,
    ) -> Self {
        let scheduler = Arc::new(StepScheduler::new(
            store.clone(),
            broadcaster.clone(),
            durations,
            timing,
        ));
        Self {
            registry,
            store,
            broadcaster,
            scheduler,
        }
    }

    /// Build an engine with an in-memory store and random step durations.
    ///
    /// Fails if a configured template is malformed.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let registry = TemplateRegistry::from_config(&config.templates)?;
        let store = Arc::new(MemoryWorkflowStore::with_history_limit(
            config.engine.history_limit,
        ));
        let broadcaster = Arc::new(EventBroadcaster::new(
            config.broadcast.scope,
            config.broadcast.channel_capacity,
        ));
        Ok(Self::new(
            registry,
            store,
            broadcaster,
            Arc::new(RandomDurations::from_config(&config.engine)),
            SchedulerTiming::from_config(&config.engine),
        ))
    }

    /// Initialize the store. Call once before serving requests.
    pub async fn init(&self) -> Result<(), EngineError> {
        self.store.init().await?;
        info!(
            "Workflow engine ready ({} templates, broadcast scope {:?})",
            self.registry.len(),
            self.broadcaster.scope()
        );
        Ok(())
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Arc<EventBroadcaster> {
        &self.broadcaster
    }

    /// Start a new instance of `template_name` and return its id.
    pub async fn execute(
        &self,
        template_name: &str,
        meta: RequestMeta,
    ) -> Result<String, EngineError> {
        let template = self.registry.lookup(template_name)?;
        let instance = self.store.create(template, meta).await?;
        let id = instance.id.clone();

        let eta = format_duration(self.scheduler.timing().estimate(template.len()));
        self.store
            .update_active(&id, &mut |w| {
                w.eta = Some(eta.clone());
                StoreAction::Keep
            })
            .await?;

        info!(
            "Workflow {} started from template '{}' ({} steps)",
            id,
            template.name,
            template.len()
        );
        self.broadcaster.publish(WorkflowEvent::WorkflowStarted {
            workflow_id: id.clone(),
            workflow_name: instance.display_name().to_string(),
        });
        self.scheduler.launch(id.clone(), instance.epoch);

        Ok(id)
    }

    /// Full instance, active or archived.
    pub async fn get(&self, id: &str) -> Result<WorkflowInstance, EngineError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound(id.to_string()))
    }

    pub async fn list_active(&self) -> Result<Vec<WorkflowSummary>, EngineError> {
        self.store.list_active().await
    }

    pub async fn list_history(&self) -> Result<Vec<WorkflowInstance>, EngineError> {
        self.store.list_history().await
    }

    pub async fn counts(&self) -> Result<StoreCounts, EngineError> {
        self.store.counts().await
    }

    /// Freeze an active instance. Its pending timer fires later and no-ops.
    pub async fn pause(&self, id: &str) -> Result<(), EngineError> {
        self.store
            .update_active(id, &mut |w| {
                w.status = WorkflowStatus::Paused;
                StoreAction::Keep
            })
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound(id.to_string()))?;
        info!("Workflow {} paused", id);
        Ok(())
    }

    /// Continue a paused instance from its current step.
    pub async fn resume(&self, id: &str) -> Result<(), EngineError> {
        let mut outcome = Err(WorkflowStatus::Running);
        self.store
            .update_active(id, &mut |w| {
                outcome = if w.status == WorkflowStatus::Paused {
                    w.status = WorkflowStatus::Running;
                    w.epoch += 1;
                    Ok(w.epoch)
                } else {
                    Err(w.status)
                };
                StoreAction::Keep
            })
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound(id.to_string()))?;

        let epoch = outcome.map_err(|status| EngineError::InvalidState {
            id: id.to_string(),
            status: status.to_string(),
            expected: WorkflowStatus::Paused.to_string(),
        })?;

        info!("Workflow {} resumed (run {})", id, epoch);
        self.scheduler.launch(id.to_string(), epoch);
        Ok(())
    }

    /// Terminate an active instance and archive it immediately.
    pub async fn stop(&self, id: &str) -> Result<(), EngineError> {
        let now = Utc::now();
        self.store
            .update_active(id, &mut |w| {
                w.status = WorkflowStatus::Stopped;
                w.completed_at = Some(now);
                StoreAction::Archive
            })
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound(id.to_string()))?;
        info!("Workflow {} stopped", id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
