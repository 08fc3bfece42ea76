//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub broadcast: BroadcastConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extra workflow templates keyed by name. A name that matches a
    /// built-in template replaces it.
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Step scheduler timings and history retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay between creation (or resume) and the first step.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Lower bound (inclusive) of the simulated step duration.
    #[serde(default = "default_step_min_ms")]
    pub step_min_ms: u64,

    /// Upper bound (exclusive) of the simulated step duration.
    #[serde(default = "default_step_max_ms")]
    pub step_max_ms: u64,

    /// Pause between a completed step and the next one.
    #[serde(default = "default_inter_step_delay_ms")]
    pub inter_step_delay_ms: u64,

    /// Range of the duration label reported on completed steps, in seconds.
    #[serde(default = "default_label_min_secs")]
    pub label_min_secs: u64,

    #[serde(default = "default_label_max_secs")]
    pub label_max_secs: u64,

    /// Maximum number of archived workflows kept. `0` keeps everything.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            step_min_ms: default_step_min_ms(),
            step_max_ms: default_step_max_ms(),
            inter_step_delay_ms: default_inter_step_delay_ms(),
            label_min_secs: default_label_min_secs(),
            label_max_secs: default_label_max_secs(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_step_min_ms() -> u64 {
    3000
}

fn default_step_max_ms() -> u64 {
    8000
}

fn default_inter_step_delay_ms() -> u64 {
    2000
}

fn default_label_min_secs() -> u64 {
    30
}

fn default_label_max_secs() -> u64 {
    150
}

fn default_history_limit() -> usize {
    1000
}

/// Which subscribers receive a workflow event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastScope {
    /// Every connected subscriber receives every event.
    #[default]
    Global,
    /// Only subscribers that joined the workflow's group receive its events.
    Subscribed,
}

/// Event broadcast configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    #[serde(default)]
    pub scope: BroadcastScope,

    /// Per-subscriber queue capacity; events beyond it are dropped.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            scope: BroadcastScope::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write a daily-rolling log file in addition to the console.
    #[serde(default)]
    pub file_enabled: bool,

    /// Directory for log files. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_dir: Option<PathBuf>,

    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: false,
            file_dir: None,
            max_log_files: default_max_log_files(),
        }
    }
}

impl LoggingConfig {
    /// Resolve the log directory, falling back to `<data dir>/flowdeck/logs`.
    pub fn resolved_file_dir(&self) -> PathBuf {
        self.file_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("flowdeck")
                .join("logs")
        })
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    14
}

/// A workflow template declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Human-readable title. Defaults to the template key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    pub steps: Vec<String>,

    pub agents: Vec<String>,
}
