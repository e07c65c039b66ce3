//! Anthropic API client implementation
//!
//! This module implements the LlmClient trait for the Anthropic (Claude) API,
//! both single-shot and streaming via SSE.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::config::LlmConfig;
use crate::error::{RelayError, Result};
use crate::llm::client::LlmClient;
use crate::llm::streaming::{StreamChunk, StreamParser, parse_wire_event};
use crate::llm::types::{CompletionRequest, CompletionResponse, StopReason, ToolCall, Usage};

/// Anthropic API base URL
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    ///
    /// Reads ANTHROPIC_API_KEY from environment
    pub fn new(config: LlmConfig) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| RelayError::Llm("ANTHROPIC_API_KEY not set".to_string()))?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RelayError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Build the request body for the Anthropic API
    fn build_request(&self, request: &CompletionRequest, stream: bool) -> Value {
        let model = request.model.as_ref().unwrap_or(&self.config.model).clone();

        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);

        let mut body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": request.messages
        });

        if !request.system.is_empty() {
            body["system"] = json!(request.system);
        }

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| t.to_anthropic_schema())
                .collect();
            body["tools"] = json!(tools);
        }

        if stream {
            body["stream"] = json!(true);
        }

        body
    }

    fn request_builder(&self, body: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
    }

    /// Parse a non-streaming API response into a CompletionResponse
    fn parse_response(&self, body: Value) -> Result<CompletionResponse> {
        let stop_reason = body["stop_reason"]
            .as_str()
            .map(StopReason::parse)
            .unwrap_or_default();

        let usage = if let Some(u) = body.get("usage") {
            Usage::new(
                u["input_tokens"].as_u64().unwrap_or(0),
                u["output_tokens"].as_u64().unwrap_or(0),
            )
        } else {
            Usage::default()
        };

        let mut content = String::new();
        let mut tool_calls = Vec::new();

        if let Some(blocks) = body["content"].as_array() {
            for block in blocks {
                match block["type"].as_str() {
                    Some("text") => {
                        if let Some(text) = block["text"].as_str() {
                            if !content.is_empty() {
                                content.push('\n');
                            }
                            content.push_str(text);
                        }
                    }
                    Some("tool_use") => {
                        let id = block["id"].as_str().unwrap_or("").to_string();
                        let name = block["name"].as_str().unwrap_or("").to_string();
                        let input = block["input"].clone();
                        tool_calls.push(ToolCall::new(id, name, input));
                    }
                    _ => {}
                }
            }
        }

        Ok(CompletionResponse {
            content,
            tool_calls,
            stop_reason,
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request, false);

        let response = self
            .request_builder(&body)
            .send()
            .await
            .map_err(|e| RelayError::Llm(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RelayError::Llm(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RelayError::Llm(format!("Failed to parse response: {}", e)))?;

        self.parse_response(body)
    }

    async fn stream(
        &self,
        request: CompletionRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<CompletionResponse> {
        let body = self.build_request(&request, true);

        let mut source = EventSource::new(self.request_builder(&body))
            .map_err(|e| RelayError::Llm(format!("Failed to open event stream: {}", e)))?;

        let mut parser = StreamParser::new();

        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(message)) => {
                    let Some(wire) = parse_wire_event(&message.data) else {
                        continue;
                    };
                    for chunk in parser.process_event(wire) {
                        if let StreamChunk::Error(ref message) = chunk {
                            let message = message.clone();
                            let _ = chunk_tx.send(chunk).await;
                            source.close();
                            return Err(RelayError::Llm(message));
                        }
                        // Receiver dropped means the caller went away; stop streaming
                        if chunk_tx.send(chunk).await.is_err() {
                            source.close();
                            return Err(RelayError::Stream(
                                "stream consumer dropped".to_string(),
                            ));
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(e) => {
                    source.close();
                    return Err(RelayError::Llm(format!("Streaming request failed: {}", e)));
                }
            }
        }

        Ok(parser.into_response())
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::Message;

    fn test_client() -> AnthropicClient {
        AnthropicClient::with_api_key("test-key".to_string(), LlmConfig::default()).unwrap()
    }

    #[test]
    fn test_client_with_api_key() {
        let client = test_client();
        assert!(client.is_ready());
        assert_eq!(client.model(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn test_empty_api_key_not_ready() {
        let client =
            AnthropicClient::with_api_key(String::new(), LlmConfig::default()).unwrap();
        assert!(!client.is_ready());
    }

    #[test]
    fn test_build_request_basic() {
        let client = test_client();
        let request = CompletionRequest::new("You are helpful").with_user_message("Hello");

        let body = client.build_request(&request, false);

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["max_tokens"], 8192);
        assert_eq!(body["system"], "You are helpful");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_build_request_streaming_flag() {
        let client = test_client();
        let request = CompletionRequest::new("test").with_user_message("Hello");

        let body = client.build_request(&request, true);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_build_request_with_tools() {
        let client = test_client();

        let tool = crate::llm::ToolDefinition::new(
            "search",
            "Search for information",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" }
                },
                "required": ["query"]
            }),
        );

        let request = CompletionRequest::new("test")
            .with_user_message("Find rust docs")
            .with_tools(vec![tool]);

        let body = client.build_request(&request, false);

        assert!(body["tools"].is_array());
        assert_eq!(body["tools"][0]["name"], "search");
    }

    #[test]
    fn test_build_request_block_content() {
        let client = test_client();
        let request = CompletionRequest::new("test").with_message(Message::blocks(
            crate::llm::Role::User,
            vec![crate::llm::ContentBlock::ToolResult {
                tool_use_id: "toolu_1".to_string(),
                content: "result".to_string(),
                is_error: false,
            }],
        ));

        let body = client.build_request(&request, false);
        assert_eq!(body["messages"][0]["content"][0]["type"], "tool_result");
        assert_eq!(body["messages"][0]["content"][0]["tool_use_id"], "toolu_1");
    }

    #[test]
    fn test_parse_response_text_only() {
        let client = test_client();

        let api_response = json!({
            "content": [
                { "type": "text", "text": "Hello there!" }
            ],
            "stop_reason": "end_turn",
            "usage": {
                "input_tokens": 10,
                "output_tokens": 5
            }
        });

        let response = client.parse_response(api_response).unwrap();

        assert_eq!(response.content, "Hello there!");
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 10);
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[test]
    fn test_parse_response_with_tool_use() {
        let client = test_client();

        let api_response = json!({
            "content": [
                { "type": "text", "text": "Let me search for that" },
                {
                    "type": "tool_use",
                    "id": "toolu_123",
                    "name": "search",
                    "input": { "query": "mountains" }
                }
            ],
            "stop_reason": "tool_use",
            "usage": {
                "input_tokens": 50,
                "output_tokens": 30
            }
        });

        let response = client.parse_response(api_response).unwrap();

        assert_eq!(response.content, "Let me search for that");
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "toolu_123");
        assert_eq!(response.tool_calls[0].name, "search");
        assert_eq!(response.tool_calls[0].input["query"], "mountains");
        assert_eq!(response.stop_reason, StopReason::ToolUse);
    }

    #[test]
    fn test_debug_impl_hides_api_key() {
        let client = test_client();
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("AnthropicClient"));
        assert!(!debug_str.contains("test-key"));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnthropicClient>();
    }
}
