//! FlowDeck - multi-agent workflow tracker
//!
//! Main entry point for the FlowDeck CLI and server.

mod cli;
mod server;

use clap::Parser;

use flowdeck_engine::TemplateRegistry;

use crate::cli::{Cli, Commands};
use crate::server::{init_tracing, load_config, run_server, validate_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    init_tracing(&config.logging)?;

    match cli.command {
        None => run_server(config, None, None).await,
        Some(Commands::Run { host, port }) => run_server(config, host, port).await,
        Some(Commands::Templates) => {
            validate_config(&config)?;
            let registry = TemplateRegistry::from_config(&config.templates)?;
            for template in registry.list() {
                println!("{} ({})", template.name, template.display_name);
                for (index, (step, agent)) in template.assignments().enumerate() {
                    println!("  {}. {} - {}", index + 1, step, agent);
                }
            }
            Ok(())
        }
        Some(Commands::CheckConfig) => {
            validate_config(&config)?;
            TemplateRegistry::from_config(&config.templates)?;
            println!("Configuration OK: {}", cli.config.display());
            Ok(())
        }
    }
}
