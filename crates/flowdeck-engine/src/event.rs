//! Lifecycle events delivered to real-time subscribers.

use serde::{Deserialize, Serialize};

/// Workflow lifecycle event, serialized as a JSON object tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    WorkflowStarted {
        workflow_id: String,
        workflow_name: String,
    },
    WorkflowStepStarted {
        workflow_id: String,
        step_index: usize,
        step_name: String,
    },
    WorkflowStepCompleted {
        workflow_id: String,
        step_index: usize,
        step_name: String,
    },
    WorkflowCompleted {
        workflow_id: String,
        workflow_name: String,
    },
}

impl WorkflowEvent {
    /// Id of the workflow the event belongs to.
    pub fn workflow_id(&self) -> &str {
        match self {
            Self::WorkflowStarted { workflow_id, .. }
            | Self::WorkflowStepStarted { workflow_id, .. }
            | Self::WorkflowStepCompleted { workflow_id, .. }
            | Self::WorkflowCompleted { workflow_id, .. } => workflow_id,
        }
    }

    /// Wire name of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WorkflowStarted { .. } => "workflow_started",
            Self::WorkflowStepStarted { .. } => "workflow_step_started",
            Self::WorkflowStepCompleted { .. } => "workflow_step_completed",
            Self::WorkflowCompleted { .. } => "workflow_completed",
        }
    }
}
