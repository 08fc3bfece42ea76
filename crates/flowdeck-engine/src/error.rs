//! Engine error types.

use thiserror::Error;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No template registered under this name.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Workflow id is neither active nor archived (or not active, for
    /// operations that need a live instance).
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    /// Operation not allowed in the workflow's current status.
    #[error("Workflow {id} is {status}, expected {expected}")]
    InvalidState {
        id: String,
        status: String,
        expected: String,
    },

    /// Malformed template definition.
    #[error("Invalid template '{name}': {reason}")]
    InvalidTemplate { name: String, reason: String },

    /// An instance with this id is already stored.
    #[error("Duplicate workflow id: {0}")]
    DuplicateId(String),

    /// Storage backend failure.
    #[error("Store error: {0}")]
    Store(String),
}
