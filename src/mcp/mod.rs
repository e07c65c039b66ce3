//! MCP transport - per-provider clients and the connection registry

pub mod client;
pub mod registry;

pub use client::{McpClient, RemoteTool};
pub use registry::{ProviderKind, ProviderRegistry};
