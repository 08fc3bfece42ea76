//! Server initialization and startup logic for FlowDeck.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use flowdeck_api::{AppState, InterfaceConfig, InterfaceServer};
use flowdeck_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use flowdeck_engine::WorkflowEngine;

/// Initialize tracing with console and, when enabled, daily-rolling file output.
///
/// `RUST_LOG` takes precedence over `logging.level`.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = if logging.file_enabled {
        let log_dir = PathBuf::from(ConfigLoader::expand_path(
            &logging.resolved_file_dir().to_string_lossy(),
        ));
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("flowdeck")
            .filename_suffix("log")
            .max_log_files(logging.max_log_files)
            .build(&log_dir)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Keep the guard alive for the program duration.
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
    } else {
        None
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Load the configuration file, falling back to defaults when it is absent.
pub(crate) fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let path = PathBuf::from(ConfigLoader::expand_path(&path.to_string_lossy()));
    Ok(ConfigLoader::load_or_default(&path)?)
}

/// Validate `config`, logging warnings. Any error is fatal.
pub(crate) fn validate_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let warnings = ConfigValidator::validate(config).ensure_valid()?;
    for warning in warnings {
        warn!("Config warning at {}: {}", warning.path, warning.message);
    }
    Ok(())
}

/// Run the server in foreground.
pub(crate) async fn run_server(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting FlowDeck v{}", env!("CARGO_PKG_VERSION"));

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    validate_config(&config)?;

    let engine = Arc::new(WorkflowEngine::from_config(&config)?);
    engine.init().await?;

    let state = Arc::new(AppState::new(engine));
    let server = InterfaceServer::new(InterfaceConfig::from(&config.server), state);

    info!("API server: http://{}", server.addr());
    info!("WebSocket: ws://{}/ws", server.addr());

    server.run().await
}
