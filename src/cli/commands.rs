//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve: run the HTTP gateway (the default)
//! - tools: connect to the providers and print the discovered tool catalog

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chatrelay - a chat gateway with MCP tool providers
#[derive(Parser, Debug)]
#[command(name = "chatrelay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP gateway
    Serve {
        /// Bind address, overrides the configured one
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Connect to the configured providers and list their tools
    Tools,
}
