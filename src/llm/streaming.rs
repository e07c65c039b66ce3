//! Streaming support for LLM responses.
//!
//! Wire-level event types for the Anthropic Messages API SSE stream, the
//! consumer-facing chunk type, and the parser state machine that turns one
//! into the other while accumulating the final response.

use serde::Deserialize;
use serde_json::Value;

use crate::llm::types::{CompletionResponse, StopReason, ToolCall, Usage};

/// Raw SSE event payload from the Anthropic API
#[derive(Debug, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub content_block: Option<WireContentBlock>,
    #[serde(default)]
    pub delta: Option<WireDelta>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
    #[serde(default)]
    pub error: Option<WireError>,
}

#[derive(Debug, Deserialize)]
pub struct WireContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireDelta {
    #[serde(rename = "type", default)]
    pub delta_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub partial_json: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct WireError {
    #[serde(default)]
    pub message: String,
}

/// Chunk types emitted to consumers during streaming.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Text content delta
    Text(String),
    /// Tool call started
    ToolCall { id: String, name: String },
    /// Tool input JSON delta
    ToolInput { id: String, input_delta: String },
    /// Stream completed successfully
    Done,
    /// Stream error
    Error(String),
}

/// Parse a raw SSE data line into a wire event.
pub fn parse_wire_event(data: &str) -> Option<WireEvent> {
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    serde_json::from_str(data).ok()
}

/// State tracker for parsing streaming responses.
///
/// Feeds on wire events, emits consumer chunks, and accumulates the text,
/// tool calls, stop reason, and usage needed for the final response.
#[derive(Debug, Default)]
pub struct StreamParser {
    current_tool_id: Option<String>,
    current_tool_name: Option<String>,
    tool_input: String,
    text_content: String,
    tool_calls: Vec<ToolCall>,
    stop_reason: StopReason,
    usage: Usage,
}

impl StreamParser {
    /// Create a new stream parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a wire event and emit consumer chunks.
    pub fn process_event(&mut self, event: WireEvent) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();

        match event.event_type.as_str() {
            "message_start" => {
                if let Some(usage) = event.usage {
                    self.usage.input_tokens = usage.input_tokens.unwrap_or(0);
                }
            }

            "content_block_start" => {
                if let Some(cb) = event.content_block
                    && cb.block_type == "tool_use"
                {
                    let id = cb.id.unwrap_or_default();
                    let name = cb.name.unwrap_or_default();
                    self.current_tool_id = Some(id.clone());
                    self.current_tool_name = Some(name.clone());
                    self.tool_input.clear();
                    chunks.push(StreamChunk::ToolCall { id, name });
                }
            }

            "content_block_delta" => {
                if let Some(delta) = event.delta {
                    match delta.delta_type.as_deref() {
                        Some("text_delta") => {
                            if let Some(text) = delta.text {
                                self.text_content.push_str(&text);
                                chunks.push(StreamChunk::Text(text));
                            }
                        }
                        Some("input_json_delta") => {
                            if let Some(json) = delta.partial_json {
                                self.tool_input.push_str(&json);
                                if let Some(id) = &self.current_tool_id {
                                    chunks.push(StreamChunk::ToolInput {
                                        id: id.clone(),
                                        input_delta: json,
                                    });
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }

            "content_block_stop" => {
                if let (Some(id), Some(name)) =
                    (self.current_tool_id.take(), self.current_tool_name.take())
                {
                    // Empty input streams still produce a valid tool call
                    let input: Value = serde_json::from_str(&self.tool_input)
                        .unwrap_or(Value::Object(serde_json::Map::new()));
                    self.tool_calls.push(ToolCall::new(id, name, input));
                    self.tool_input.clear();
                }
            }

            "message_delta" => {
                if let Some(delta) = event.delta
                    && let Some(reason) = delta.stop_reason
                {
                    self.stop_reason = StopReason::parse(&reason);
                }
                if let Some(usage) = event.usage
                    && let Some(out) = usage.output_tokens
                {
                    self.usage.output_tokens = out;
                }
            }

            "message_stop" => {
                chunks.push(StreamChunk::Done);
            }

            "error" => {
                let message = event
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "unknown stream error".to_string());
                chunks.push(StreamChunk::Error(message));
            }

            _ => {}
        }

        chunks
    }

    /// Consume the parser and produce the accumulated response.
    pub fn into_response(self) -> CompletionResponse {
        CompletionResponse {
            content: self.text_content,
            tool_calls: self.tool_calls,
            stop_reason: self.stop_reason,
            usage: self.usage,
        }
    }
}
