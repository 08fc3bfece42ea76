//! Workflow instance model.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::template::WorkflowTemplate;

/// Prefix of every workflow id.
pub const WORKFLOW_ID_PREFIX: &str = "wf_";

/// Duration label of a step that has not completed yet.
pub const PENDING_DURATION: &str = "-";

/// Generate a fresh workflow id: `wf_` followed by 8 hex characters.
pub fn generate_workflow_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}{}", WORKFLOW_ID_PREFIX, &simple[..8])
}

/// Lifecycle status of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Paused,
    Stopped,
    Completed,
}

impl WorkflowStatus {
    /// Stopped and completed instances live in history.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
}

/// One unit of simulated work within an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepState {
    pub name: String,
    pub agent: String,
    pub status: StepStatus,
    /// `"-"` until the step completes, then e.g. `"42s"`.
    pub duration: String,
}

/// Append-only execution log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    /// `"<index + 1>. <step name>"`.
    pub step_label: String,
    pub agent: String,
    pub status: StepStatus,
    pub message: String,
}

/// Caller-supplied metadata, opaque to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<serde_json::Value>,
}

impl RequestMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// One running or terminated occurrence of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<serde_json::Value>,
    pub template_ref: String,
    pub status: WorkflowStatus,
    pub progress: u8,
    pub current_step_index: usize,
    pub current_step: Option<String>,
    pub steps: Vec<StepState>,
    pub logs: Vec<LogEntry>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub eta: Option<String>,
    pub duration: Option<String>,
    pub results: Option<String>,
    /// Bumped on every resume so timers from an earlier run are ignored.
    #[serde(skip)]
    pub epoch: u64,
}

impl WorkflowInstance {
    /// Build a fresh instance from a template: all steps pending, running at 0%.
    pub fn from_template(id: String, template: &WorkflowTemplate, meta: RequestMeta) -> Self {
        let steps = template
            .assignments()
            .map(|(name, agent)| StepState {
                name: name.to_string(),
                agent: agent.to_string(),
                status: StepStatus::Pending,
                duration: PENDING_DURATION.to_string(),
            })
            .collect();

        Self {
            id,
            name: meta.name,
            description: meta.description,
            priority: meta.priority,
            template_ref: template.name.clone(),
            status: WorkflowStatus::Running,
            progress: 0,
            current_step_index: 0,
            current_step: template.steps.first().cloned(),
            steps,
            logs: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
            eta: None,
            duration: None,
            results: None,
            epoch: 0,
        }
    }

    /// Name used in lifecycle events, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn is_finished(&self) -> bool {
        self.current_step_index >= self.steps.len()
    }

    /// Summary row for the active list.
    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            status: self.status,
            progress: self.progress,
            started_at: self.started_at,
            eta: self.eta.clone(),
            current_step: self.current_step.clone(),
        }
    }
}

/// Compact view of an active instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: String,
    pub name: Option<String>,
    pub status: WorkflowStatus,
    pub progress: u8,
    pub started_at: DateTime<Utc>,
    pub eta: Option<String>,
    pub current_step: Option<String>,
}

/// Integer percentage of `numerator / total`, rounded half up.
pub fn percent(numerator: f64, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((numerator / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Format a duration as `"3m 45s"`, or `"12s"` below a minute.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (minutes, seconds) = (secs / 60, secs % 60);
    if minutes == 0 {
        format!("{}s", seconds)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}
