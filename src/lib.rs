//! Chatrelay - a chat gateway with MCP tool providers
//!
//! Forwards conversations to a hosted LLM, exposing schema-adapted tools
//! from remote MCP providers, and relays the model's answer to clients as
//! server-sent events.

pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod server;
pub mod tools;

pub use error::{RelayError, Result};
