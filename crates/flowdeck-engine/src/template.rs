//! Workflow templates and the startup catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use flowdeck_config::TemplateConfig;

use crate::error::EngineError;

/// A named, immutable step/agent sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    /// Lookup key, e.g. `standard_process`.
    pub name: String,
    /// Human-readable title.
    pub display_name: String,
    /// Ordered step names.
    pub steps: Vec<String>,
    /// Agent assigned to the step at the same position.
    pub agents: Vec<String>,
}

impl WorkflowTemplate {
    /// Build a template, rejecting empty or misaligned step/agent lists.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        steps: Vec<String>,
        agents: Vec<String>,
    ) -> Result<Self, EngineError> {
        let name = name.into();
        if steps.is_empty() {
            return Err(EngineError::InvalidTemplate {
                name,
                reason: "template has no steps".to_string(),
            });
        }
        if steps.len() != agents.len() {
            return Err(EngineError::InvalidTemplate {
                reason: format!("{} steps but {} agents", steps.len(), agents.len()),
                name,
            });
        }
        Ok(Self {
            name,
            display_name: display_name.into(),
            steps,
            agents,
        })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed template; kept for clippy's `len` rule.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate `(step, agent)` pairs in order.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.steps
            .iter()
            .map(String::as_str)
            .zip(self.agents.iter().map(String::as_str))
    }
}

/// Static catalog of workflow templates, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, WorkflowTemplate>,
}

impl TemplateRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four built-in templates.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, display_name, pairs) in BUILTIN_TEMPLATES {
            let (steps, agents) = pairs
                .iter()
                .map(|(step, agent)| (step.to_string(), agent.to_string()))
                .unzip();
            // Built-ins are well-formed; the constructor check still runs.
            if let Ok(template) = WorkflowTemplate::new(*name, *display_name, steps, agents) {
                registry.templates.insert(template.name.clone(), template);
            }
        }
        registry
    }

    /// Built-in templates overlaid with configured ones. Any malformed
    /// configured template fails the whole load.
    pub fn from_config<'a>(
        configured: impl IntoIterator<Item = (&'a String, &'a TemplateConfig)>,
    ) -> Result<Self, EngineError> {
        let mut registry = Self::builtin();
        for (name, config) in configured {
            let display_name = config.display_name.clone().unwrap_or_else(|| name.clone());
            let template = WorkflowTemplate::new(
                name.clone(),
                display_name,
                config.steps.clone(),
                config.agents.clone(),
            )?;
            registry.insert(template);
        }
        Ok(registry)
    }

    /// Add or replace a template.
    pub fn insert(&mut self, template: WorkflowTemplate) {
        debug!("Registering template '{}' ({} steps)", template.name, template.len());
        self.templates.insert(template.name.clone(), template);
    }

    /// Find a template by name.
    pub fn lookup(&self, name: &str) -> Result<&WorkflowTemplate, EngineError> {
        self.templates
            .get(name)
            .ok_or_else(|| EngineError::TemplateNotFound(name.to_string()))
    }

    /// All templates sorted by name.
    pub fn list(&self) -> Vec<&WorkflowTemplate> {
        let mut templates: Vec<_> = self.templates.values().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

type BuiltinTemplate = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const BUILTIN_TEMPLATES: &[BuiltinTemplate] = &[
    (
        "standard_process",
        "Standard Multi-Agent Process",
        &[
            ("Planning", "Agent 03 (Planner)"),
            ("Execution", "Agent 04 (Executor)"),
            ("Review", "Agent 06 (Specialist)"),
            ("Output", "Output Handler"),
        ],
    ),
    (
        "software_development",
        "Software Development Workflow",
        &[
            ("Requirements", "Requirements Analyst"),
            ("Design", "System Designer"),
            ("Development", "Developer"),
            ("Testing", "QA Tester"),
            ("Deployment", "DevOps Engineer"),
        ],
    ),
    (
        "content_creation",
        "Content Creation Workflow",
        &[
            ("Research", "Researcher"),
            ("Planning", "Content Planner"),
            ("Writing", "Writer"),
            ("Review", "Editor"),
            ("Publishing", "Publisher"),
        ],
    ),
    (
        "data_analysis",
        "Data Analysis Workflow",
        &[
            ("Collection", "Data Collector"),
            ("Cleaning", "Data Cleaner"),
            ("Analysis", "Analyst"),
            ("Visualization", "Visualization Expert"),
            ("Report", "Report Generator"),
        ],
    ),
];
