//! CLI module for chatrelay - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running the gateway
//! and inspecting the tool providers.

pub mod commands;

pub use commands::Cli;
