//! Workflow instance storage: the active set and the archive.

use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::instance::{
    RequestMeta, WorkflowInstance, WorkflowSummary, generate_workflow_id,
};
use crate::template::WorkflowTemplate;

/// Id allocation retries before giving up.
const MAX_ID_ATTEMPTS: usize = 16;

/// What to do with an active instance after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    /// Leave it in the active set.
    Keep,
    /// Move it to the front of history in the same critical section.
    Archive,
}

/// Mutation applied to an active instance under the store's write lock.
pub type ActiveMutation<'a> = dyn FnMut(&mut WorkflowInstance) -> StoreAction + Send + 'a;

/// Instance counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub active: usize,
    pub history: usize,
}

/// Trait for workflow instance storage.
///
/// Implementations own the active set (keyed by id) and the archive
/// (most-recently-archived first). Archived instances are never mutated.
#[async_trait::async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Prepare the backend. Called once at process start.
    async fn init(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Insert a new active instance. Fails if the id is already known.
    async fn insert(&self, instance: WorkflowInstance) -> Result<(), EngineError>;

    /// Whether the id is used by an active or archived instance.
    async fn contains(&self, id: &str) -> Result<bool, EngineError>;

    /// Look up an instance, active first, then history.
    async fn get(&self, id: &str) -> Result<Option<WorkflowInstance>, EngineError>;

    /// Summaries of all active instances, oldest first.
    async fn list_active(&self) -> Result<Vec<WorkflowSummary>, EngineError>;

    /// Archived instances, most recently archived first.
    async fn list_history(&self) -> Result<Vec<WorkflowInstance>, EngineError>;

    /// Apply `mutation` to the active instance `id`.
    ///
    /// Returns `None` when `id` is not active; the mutation is not called.
    async fn update_active(
        &self,
        id: &str,
        mutation: &mut ActiveMutation<'_>,
    ) -> Result<Option<StoreAction>, EngineError>;

    /// Move an active instance to the front of history.
    ///
    /// Returns `false` (and does nothing) when `id` is not active.
    async fn archive(&self, id: &str) -> Result<bool, EngineError>;

    /// Number of active and archived instances.
    async fn counts(&self) -> Result<StoreCounts, EngineError>;

    /// Build and register a fresh instance of `template` under a new id.
    async fn create(
        &self,
        template: &WorkflowTemplate,
        meta: RequestMeta,
    ) -> Result<WorkflowInstance, EngineError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_workflow_id();
            if self.contains(&id).await? {
                debug!("Workflow id collision on {}, retrying", id);
                continue;
            }
            let instance = WorkflowInstance::from_template(id, template, meta.clone());
            match self.insert(instance.clone()).await {
                Ok(()) => return Ok(instance),
                Err(EngineError::DuplicateId(id)) => {
                    debug!("Workflow id {} taken concurrently, retrying", id);
                }
                Err(e) => return Err(e),
            }
        }
        Err(EngineError::Store(
            "could not allocate a unique workflow id".to_string(),
        ))
    }
}

#[derive(Default)]
struct StoreInner {
    active: HashMap<String, WorkflowInstance>,
    /// Insertion order of `active`, so listings are stable.
    order: Vec<String>,
    history: VecDeque<WorkflowInstance>,
}

impl StoreInner {
    fn archive(&mut self, id: &str, history_limit: usize) -> bool {
        let Some(instance) = self.active.remove(id) else {
            return false;
        };
        self.order.retain(|existing| existing != id);
        info!(
            "Archived workflow {} with status {}",
            instance.id, instance.status
        );
        self.history.push_front(instance);
        if history_limit > 0 {
            while self.history.len() > history_limit {
                if let Some(evicted) = self.history.pop_back() {
                    debug!("Evicted workflow {} from history", evicted.id);
                }
            }
        }
        true
    }
}

/// In-memory workflow store. Nothing survives a restart.
pub struct MemoryWorkflowStore {
    inner: RwLock<StoreInner>,
    history_limit: usize,
}

impl MemoryWorkflowStore {
    /// Create a store with unbounded history.
    pub fn new() -> Self {
        Self::with_history_limit(0)
    }

    /// Create a store keeping at most `limit` archived instances (`0` = no bound).
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            history_limit: limit,
        }
    }
}

impl Default for MemoryWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WorkflowStore for MemoryWorkflowStore {
    async fn init(&self) -> Result<(), EngineError> {
        debug!(
            "MemoryWorkflowStore initialized (history limit: {})",
            self.history_limit
        );
        Ok(())
    }

    async fn insert(&self, instance: WorkflowInstance) -> Result<(), EngineError> {
        let mut inner = self.inner.write().await;
        let id = instance.id.clone();
        if inner.active.contains_key(&id) || inner.history.iter().any(|w| w.id == id) {
            return Err(EngineError::DuplicateId(id));
        }
        inner.order.push(id.clone());
        inner.active.insert(id, instance);
        Ok(())
    }

    async fn contains(&self, id: &str) -> Result<bool, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.active.contains_key(id) || inner.history.iter().any(|w| w.id == id))
    }

    async fn get(&self, id: &str) -> Result<Option<WorkflowInstance>, EngineError> {
        let inner = self.inner.read().await;
        if let Some(instance) = inner.active.get(id) {
            return Ok(Some(instance.clone()));
        }
        Ok(inner.history.iter().find(|w| w.id == id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<WorkflowSummary>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.active.get(id))
            .map(WorkflowInstance::summary)
            .collect())
    }

    async fn list_history(&self) -> Result<Vec<WorkflowInstance>, EngineError> {
        let inner = self.inner.read().await;
        Ok(inner.history.iter().cloned().collect())
    }

    async fn update_active(
        &self,
        id: &str,
        mutation: &mut ActiveMutation<'_>,
    ) -> Result<Option<StoreAction>, EngineError> {
        let mut inner = self.inner.write().await;
        let Some(instance) = inner.active.get_mut(id) else {
            return Ok(None);
        };
        let action = mutation(instance);
        if action == StoreAction::Archive {
            inner.archive(id, self.history_limit);
        }
        Ok(Some(action))
    }

    async fn archive(&self, id: &str) -> Result<bool, EngineError> {
        let mut inner = self.inner.write().await;
        Ok(inner.archive(id, self.history_limit))
    }

    async fn counts(&self) -> Result<StoreCounts, EngineError> {
        let inner = self.inner.read().await;
        Ok(StoreCounts {
            active: inner.active.len(),
            history: inner.history.len(),
        })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
