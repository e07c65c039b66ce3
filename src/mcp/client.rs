//! MCP client over streamable HTTP
//!
//! One client per tool provider. Speaks JSON-RPC 2.0: `initialize` on
//! connect, `tools/list` for discovery, `tools/call` for invocation.
//! Providers may answer a POST with plain JSON or with an SSE-framed body;
//! both are handled.

use log::debug;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{RelayError, Result};

/// MCP protocol version sent during the initialize handshake
const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Request timeout for provider calls
const PROVIDER_TIMEOUT_SECS: u64 = 30;

/// A tool definition as reported by a provider
#[derive(Debug, Clone)]
pub struct RemoteTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

/// Connected MCP client for a single provider
pub struct McpClient {
    http: reqwest::Client,
    name: String,
    url: String,
    headers: Vec<(String, String)>,
    session_id: Option<String>,
}

impl McpClient {
    /// Connect to a provider: performs the initialize handshake and, on
    /// success, returns a client ready for discovery and invocation.
    pub async fn connect(
        name: impl Into<String>,
        url: impl Into<String>,
        headers: Vec<(String, String)>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()
            .map_err(|e| RelayError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        let mut client = Self {
            http,
            name: name.into(),
            url: url.into(),
            headers,
            session_id: None,
        };

        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            }
        });

        let (result, session_id) = client
            .rpc_with_session("initialize", Some(params))
            .await
            .map_err(|e| {
                RelayError::Provider(format!("initialize failed for {}: {}", client.name, e))
            })?;
        client.session_id = session_id;

        debug!(
            "[mcp] connected to {} (server: {})",
            client.name,
            result["serverInfo"]["name"].as_str().unwrap_or("unknown")
        );

        // Per protocol the client acknowledges the handshake; providers that
        // don't care will ignore it.
        client.notify("notifications/initialized").await;

        Ok(client)
    }

    /// Provider name this client is connected to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the provider for its current tool catalog
    pub async fn list_tools(&self) -> Result<Vec<RemoteTool>> {
        let result = self
            .rpc("tools/list", None)
            .await
            .map_err(|e| RelayError::Discovery(format!("tools/list failed for {}: {}", self.name, e)))?;

        let tools_array = result
            .get("tools")
            .and_then(|t| t.as_array())
            .ok_or_else(|| {
                RelayError::Discovery(format!("{} returned an invalid tools response", self.name))
            })?;

        let tools = tools_array
            .iter()
            .filter_map(|tool| {
                let name = tool.get("name")?.as_str()?;
                let description = tool
                    .get("description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("");
                let input_schema = tool.get("inputSchema").cloned().unwrap_or(Value::Null);

                Some(RemoteTool {
                    name: name.to_string(),
                    description: description.to_string(),
                    input_schema,
                })
            })
            .collect();

        Ok(tools)
    }

    /// Invoke a tool on the provider, returning its text content
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<String> {
        let params = json!({
            "name": tool_name,
            "arguments": arguments
        });

        let result = self.rpc("tools/call", Some(params)).await?;

        let text = extract_text_content(&result);

        if result
            .get("isError")
            .and_then(|e| e.as_bool())
            .unwrap_or(false)
        {
            Err(RelayError::Tool(text))
        } else {
            Ok(text)
        }
    }

    async fn rpc(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let (result, _) = self.rpc_with_session(method, params).await?;
        Ok(result)
    }

    async fn rpc_with_session(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(Value, Option<String>)> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: Some(chrono::Utc::now().timestamp_millis()),
            method: method.to_string(),
            params,
        };

        let response = self
            .request(&request)
            .send()
            .await
            .map_err(|e| RelayError::Provider(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        let session_id = response
            .headers()
            .get("mcp-session-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let text = response.text().await?;

        let payload = parse_rpc_payload(status, &content_type, &text)?;

        if let Some(error) = payload.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| format!("request failed (status {})", status));
            return Err(RelayError::Rpc { status, message });
        }

        if status >= 400 {
            return Err(RelayError::Rpc {
                status,
                message: format!("request failed (status {})", status),
            });
        }

        let result = payload
            .get("result")
            .cloned()
            .ok_or_else(|| RelayError::Rpc {
                status,
                message: "no result in response".to_string(),
            })?;

        Ok((result, session_id))
    }

    /// Fire a JSON-RPC notification (no id, no response expected)
    async fn notify(&self, method: &str) {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: None,
            method: method.to_string(),
            params: None,
        };

        if let Err(e) = self.request(&request).send().await {
            debug!("[mcp] notification {} to {} failed: {}", method, self.name, e);
        }
    }

    fn request(&self, body: &JsonRpcRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .post(&self.url)
            .header("content-type", "application/json")
            .header("accept", "application/json, text/event-stream")
            .json(body);

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }
        if let Some(session) = &self.session_id {
            builder = builder.header("mcp-session-id", session);
        }

        builder
    }
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("name", &self.name)
            .field("url", &self.url)
            .finish()
    }
}

/// Extract the JSON body from a provider response, which may arrive either
/// as plain JSON or as an SSE-framed event stream with a single data line.
fn parse_rpc_payload(status: u16, content_type: &str, text: &str) -> Result<Value> {
    let data = if content_type.starts_with("text/event-stream") {
        text.lines()
            .find_map(|line| line.strip_prefix("data: "))
            .unwrap_or(text)
    } else {
        text
    };

    serde_json::from_str(data).map_err(|_| RelayError::Rpc {
        status,
        message: "returned non-JSON response".to_string(),
    })
}

/// Join the text content blocks of a tools/call result; falls back to the
/// serialized result when no text blocks are present.
fn extract_text_content(result: &Value) -> String {
    match result.get("content").and_then(|c| c.as_array()) {
        Some(content_array) => content_array
            .iter()
            .filter_map(|item| {
                if item.get("type")?.as_str()? == "text" {
                    item.get("text").and_then(|t| t.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        None => serde_json::to_string_pretty(result).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rpc_payload_plain_json() {
        let payload =
            parse_rpc_payload(200, "application/json", r#"{"jsonrpc":"2.0","result":{}}"#).unwrap();
        assert!(payload["result"].is_object());
    }

    #[test]
    fn test_parse_rpc_payload_sse_framed() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"result\":{\"tools\":[]}}\n\n";
        let payload = parse_rpc_payload(200, "text/event-stream", body).unwrap();
        assert!(payload["result"]["tools"].is_array());
    }

    #[test]
    fn test_parse_rpc_payload_non_json_carries_status() {
        let err = parse_rpc_payload(503, "text/html", "<html>Service Unavailable</html>")
            .unwrap_err();
        match err {
            RelayError::Rpc { status, message } => {
                assert_eq!(status, 503);
                assert!(message.contains("non-JSON"));
            }
            other => panic!("expected Rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_text_content_joins_blocks() {
        let result = json!({
            "content": [
                { "type": "text", "text": "first" },
                { "type": "image", "data": "..." },
                { "type": "text", "text": "second" }
            ]
        });
        assert_eq!(extract_text_content(&result), "first\nsecond");
    }

    #[test]
    fn test_extract_text_content_fallback_serializes() {
        let result = json!({ "posts": [1, 2, 3] });
        let text = extract_text_content(&result);
        assert!(text.contains("posts"));
    }

    #[test]
    fn test_jsonrpc_request_serialization() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: Some(42),
            method: "tools/list".to_string(),
            params: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 42);
        assert_eq!(json["method"], "tools/list");
        assert!(json.get("params").is_none());
    }

    #[test]
    fn test_jsonrpc_notification_has_no_id() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("id").is_none());
    }
}
