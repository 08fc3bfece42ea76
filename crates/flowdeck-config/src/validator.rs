//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Step or inter-step delays above this are probably a typo (ms vs s).
const LONG_DELAY_WARN_MS: u64 = 10 * 60 * 1000;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn collected errors into a single `ConfigError`, handing back the
    /// warnings when the configuration is usable.
    pub fn ensure_valid(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        if self.is_valid() {
            return Ok(self.warnings);
        }
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(ConfigError::Invalid(joined))
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_engine(config, &mut result);
        Self::validate_broadcast(config, &mut result);
        Self::validate_logging(config, &mut result);
        Self::validate_templates(config, &mut result);

        result
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_engine(config: &Config, result: &mut ValidationResult) {
        let engine = &config.engine;

        if engine.step_min_ms >= engine.step_max_ms {
            result.add_error(ValidationError::new(
                "engine.step_min_ms",
                "step_min_ms must be lower than step_max_ms",
            ));
        }

        if engine.label_min_secs >= engine.label_max_secs {
            result.add_error(ValidationError::new(
                "engine.label_min_secs",
                "label_min_secs must be lower than label_max_secs",
            ));
        }

        for (path, value) in [
            ("engine.initial_delay_ms", engine.initial_delay_ms),
            ("engine.step_max_ms", engine.step_max_ms),
            ("engine.inter_step_delay_ms", engine.inter_step_delay_ms),
        ] {
            if value > LONG_DELAY_WARN_MS {
                result.add_warning(ValidationWarning::new(
                    path,
                    format!("{}ms is very long, workflows will appear stuck", value),
                ));
            }
        }

        if engine.history_limit == 0 {
            result.add_warning(ValidationWarning::new(
                "engine.history_limit",
                "history_limit is 0, archived workflows are kept forever",
            ));
        }
    }

    fn validate_broadcast(config: &Config, result: &mut ValidationResult) {
        if config.broadcast.channel_capacity == 0 {
            result.add_error(ValidationError::new(
                "broadcast.channel_capacity",
                "channel_capacity must be greater than 0",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.level.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.level",
                "Log level cannot be empty",
            ));
        }
    }

    fn validate_templates(config: &Config, result: &mut ValidationResult) {
        for (name, template) in &config.templates {
            let path = format!("templates.{}", name);

            if name.trim().is_empty() {
                result.add_error(ValidationError::new(path.clone(), "Template name cannot be empty"));
            }

            if template.steps.is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.steps", path),
                    "A template needs at least one step",
                ));
            }

            if template.steps.len() != template.agents.len() {
                result.add_error(ValidationError::new(
                    format!("{}.agents", path),
                    format!(
                        "{} steps but {} agents, every step needs exactly one agent",
                        template.steps.len(),
                        template.agents.len()
                    ),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
