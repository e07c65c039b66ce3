//! Core LLM client trait definition

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::llm::streaming::StreamChunk;
use crate::llm::types::{CompletionRequest, CompletionResponse};

/// Stateless LLM client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Streaming completion: chunks are forwarded over the channel while the
    /// full response is accumulated and returned.
    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse>;

    /// The model this client targets
    fn model(&self) -> &str;

    /// Whether the client has credentials and can issue requests
    fn is_ready(&self) -> bool;
}
