//! Error types for chatrelay
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in chatrelay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Could not establish a connection to a tool provider
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool catalog discovery failed after a successful connection
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Direct JSON-RPC transport or format error
    #[error("RPC error (status {status}): {message}")]
    Rpc { status: u16, message: String },

    /// Tool arguments rejected at the adapter boundary, before any remote call
    #[error("Invalid tool arguments: {0}")]
    ToolArgs(String),

    /// Unknown tool name in a model tool call
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool invocation failure reported by a provider
    #[error("Tool error: {0}")]
    Tool(String),

    /// Model API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Streaming relay error
    #[error("Stream error: {0}")]
    Stream(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for chatrelay operations
pub type Result<T> = std::result::Result<T, RelayError>;
