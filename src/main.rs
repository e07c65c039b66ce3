use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use chatrelay::config::Config;
use chatrelay::llm::AnthropicClient;
use chatrelay::mcp::{ProviderKind, ProviderRegistry};
use chatrelay::server::{self, AppState};
use cli::Cli;
use cli::commands::Commands;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chatrelay")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("chatrelay.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_serve(config: Config) -> Result<()> {
    let llm = AnthropicClient::new(config.llm.clone()).context("Failed to create LLM client")?;
    let state = Arc::new(AppState::new(config, Arc::new(llm)));

    println!(
        "{} {}",
        "Listening on".green(),
        state.config.server.bind.cyan()
    );

    server::serve(state).await.context("Server failed")?;
    Ok(())
}

async fn run_tools(config: Config) -> Result<()> {
    let registry = ProviderRegistry::new(config.providers.clone());

    for kind in [ProviderKind::Search, ProviderKind::Assets, ProviderKind::Cms] {
        match registry.get_or_connect(kind).await {
            Some(client) => {
                println!("{}", kind.as_str().green().bold());
                match client.list_tools().await {
                    Ok(tools) => {
                        for tool in tools {
                            println!("  {} - {}", tool.name.cyan(), tool.description);
                        }
                    }
                    Err(e) => println!("  {} {}", "discovery failed:".red(), e),
                }
            }
            None => println!("{} {}", kind.as_str().yellow(), "(unavailable)".dimmed()),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    info!("Starting with config from: {:?}", cli.config);

    match cli.command {
        None => run_serve(config).await,
        Some(Commands::Serve { bind }) => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            run_serve(config).await
        }
        Some(Commands::Tools) => run_tools(config).await,
    }
}
