//! Lifecycle event fan-out to connected subscribers.
//!
//! Each subscriber owns a bounded queue. Subscription groups are keyed by
//! workflow id; whether they restrict delivery depends on the configured
//! [`BroadcastScope`].

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use flowdeck_config::BroadcastScope;

use crate::event::WorkflowEvent;

/// Publish/subscribe hub for workflow lifecycle events.
pub struct EventBroadcaster {
    scope: BroadcastScope,
    capacity: usize,
    /// subscriber id -> event queue.
    subscribers: DashMap<String, mpsc::Sender<WorkflowEvent>>,
    /// workflow id -> subscriber ids that joined its group.
    groups: DashMap<String, HashSet<String>>,
}

impl EventBroadcaster {
    pub fn new(scope: BroadcastScope, capacity: usize) -> Self {
        Self {
            scope,
            capacity: capacity.max(1),
            subscribers: DashMap::new(),
            groups: DashMap::new(),
        }
    }

    pub fn scope(&self) -> BroadcastScope {
        self.scope
    }

    /// Register a subscriber and return its event queue. Re-registering an
    /// id replaces the previous queue.
    pub fn subscribe(&self, subscriber_id: impl Into<String>) -> mpsc::Receiver<WorkflowEvent> {
        let subscriber_id = subscriber_id.into();
        let (tx, rx) = mpsc::channel(self.capacity);
        debug!("Subscriber {} connected", subscriber_id);
        self.subscribers.insert(subscriber_id, tx);
        rx
    }

    /// Drop a subscriber and remove it from every group.
    pub fn disconnect(&self, subscriber_id: &str) {
        self.subscribers.remove(subscriber_id);
        self.groups.retain(|_, members| {
            members.remove(subscriber_id);
            !members.is_empty()
        });
        debug!("Subscriber {} disconnected", subscriber_id);
    }

    /// Join the group of `workflow_id`.
    pub fn subscribe_workflow(&self, subscriber_id: &str, workflow_id: &str) {
        self.groups
            .entry(workflow_id.to_string())
            .or_default()
            .insert(subscriber_id.to_string());
        debug!("Subscriber {} joined workflow {}", subscriber_id, workflow_id);
    }

    /// Leave the group of `workflow_id`.
    pub fn unsubscribe_workflow(&self, subscriber_id: &str, workflow_id: &str) {
        let now_empty = match self.groups.get_mut(workflow_id) {
            Some(mut members) => {
                members.remove(subscriber_id);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.groups.remove_if(workflow_id, |_, members| members.is_empty());
        }
        debug!("Subscriber {} left workflow {}", subscriber_id, workflow_id);
    }

    /// Subscriber ids in the group of `workflow_id`.
    pub fn group_members(&self, workflow_id: &str) -> HashSet<String> {
        self.groups
            .get(workflow_id)
            .map(|members| members.value().clone())
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` and return how many subscribers accepted it.
    ///
    /// Never blocks: a full or closed queue drops the event for that
    /// subscriber.
    pub fn publish(&self, event: WorkflowEvent) -> usize {
        let targets: Vec<(String, mpsc::Sender<WorkflowEvent>)> = match self.scope {
            BroadcastScope::Global => self
                .subscribers
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
            BroadcastScope::Subscribed => self
                .group_members(event.workflow_id())
                .into_iter()
                .filter_map(|id| {
                    let sender = self.subscribers.get(&id)?.value().clone();
                    Some((id, sender))
                })
                .collect(),
        };

        let mut delivered = 0;
        for (subscriber_id, sender) in targets {
            match sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        "Subscriber {} is lagging, dropped {} for {}",
                        subscriber_id,
                        event.kind(),
                        event.workflow_id()
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Subscriber {} queue closed, removing", subscriber_id);
                    self.subscribers
                        .remove_if(&subscriber_id, |_, existing| existing.is_closed());
                }
            }
        }

        debug!(
            "Published {} for {} to {} subscriber(s)",
            event.kind(),
            event.workflow_id(),
            delivered
        );
        delivered
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(BroadcastScope::Global, 256)
    }
}

#[cfg(test)]
#[path = "broadcaster_tests.rs"]
mod tests;
