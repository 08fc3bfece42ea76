//! # FlowDeck Engine
//!
//! Simulated multi-agent workflow execution.
//!
//! - **Templates**: named, ordered step/agent lists loaded once at startup
//! - **Store**: active instances plus a bounded archive
//! - **Scheduler**: timer-driven step progression per instance
//! - **Broadcaster**: lifecycle event fan-out to real-time subscribers
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        WorkflowEngine                         │
//! │  ┌──────────────┐  ┌───────────────┐  ┌────────────────────┐  │
//! │  │  Template    │  │ WorkflowStore │  │  EventBroadcaster  │  │
//! │  │  Registry    │  │ active/history│  │  (per-subscriber   │  │
//! │  └──────────────┘  └───────▲───────┘  │   bounded queues)  │  │
//! │                            │          └─────────▲──────────┘  │
//! │                  update_active(...)             │ publish     │
//! │                    ┌───────┴────────────────────┴──┐          │
//! │                    │ StepScheduler (task per run)  │          │
//! │                    │   sleep → transition → effects│          │
//! │                    └───────────────────────────────┘          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod broadcaster;
pub mod durations;
pub mod engine;
pub mod error;
pub mod event;
pub mod instance;
pub mod machine;
pub mod scheduler;
pub mod store;
pub mod template;

pub use broadcaster::EventBroadcaster;
pub use durations::{DurationSource, FixedDurations, RandomDurations};
pub use engine::WorkflowEngine;
pub use error::EngineError;
pub use event::WorkflowEvent;
pub use instance::{
    LogEntry, RequestMeta, StepState, StepStatus, WorkflowInstance, WorkflowStatus,
    WorkflowSummary,
};
pub use machine::{Effect, SchedulerTiming, Signal, SignalKind, transition};
pub use scheduler::StepScheduler;
pub use store::{MemoryWorkflowStore, StoreAction, StoreCounts, WorkflowStore};
pub use template::{TemplateRegistry, WorkflowTemplate};
