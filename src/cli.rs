//! CLI definitions for FlowDeck.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FlowDeck CLI.
#[derive(Parser)]
#[command(name = "flowdeck")]
#[command(about = "Multi-agent workflow tracker with real-time progress events")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "flowdeck.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the server in foreground (default)
    Run {
        /// Server host, overrides `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// List the workflow templates the server would load
    Templates,

    /// Validate the configuration file and exit
    CheckConfig,
}
