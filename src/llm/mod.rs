//! LLM integration - types, client trait, streaming, and the Anthropic backend

pub mod anthropic;
pub mod client;
pub mod streaming;
pub mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use streaming::{StreamChunk, StreamParser};
pub use types::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, MessageContent, Role,
    StopReason, ToolCall, ToolDefinition, ToolResult, Usage,
};
