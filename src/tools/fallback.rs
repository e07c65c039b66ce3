//! Direct JSON-RPC fallback for the CMS provider
//!
//! When MCP discovery against the CMS yields no usable tools, a reduced set
//! of operations is still offered by POSTing single JSON-RPC `tools/call`
//! envelopes straight at the provider endpoint, bypassing the MCP session
//! machinery entirely.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use crate::error::{RelayError, Result};
use crate::tools::adapter;
use crate::tools::definition::{AdaptedTool, ArgCheck, ToolBackend, ToolSet};

/// Request timeout for direct RPC calls
const RPC_TIMEOUT_SECS: u64 = 30;

/// A bare JSON-RPC endpoint with a shared-secret token header
pub struct RpcEndpoint {
    http: reqwest::Client,
    url: String,
    token: String,
}

impl RpcEndpoint {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(RPC_TIMEOUT_SECS))
            .build()
            .map_err(|e| RelayError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.into(),
            token: token.into(),
        })
    }

    /// Issue one `tools/call` envelope for the named provider tool and
    /// return the JSON-RPC `result` (or the whole payload when the provider
    /// omits the field).
    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value> {
        let envelope = json!({
            "jsonrpc": "2.0",
            "id": Utc::now().timestamp_millis(),
            "method": "tools/call",
            "params": {
                "name": name,
                "arguments": arguments
            }
        });

        let response = self
            .http
            .post(&self.url)
            .header("content-type", "application/json")
            .header("x-mcp-token", &self.token)
            .json(&envelope)
            .send()
            .await?;

        let status = response.status().as_u16();
        let ok = response.status().is_success();
        let text = response.text().await?;

        let payload: Value = serde_json::from_str(&text).map_err(|_| RelayError::Rpc {
            status,
            message: "returned non-JSON response".to_string(),
        })?;

        if !ok || payload.get("error").is_some() {
            let message = payload
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| format!("request failed (status {})", status));
            return Err(RelayError::Rpc { status, message });
        }

        Ok(payload.get("result").cloned().unwrap_or(payload))
    }
}

impl std::fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEndpoint").field("url", &self.url).finish()
    }
}

/// Build the reduced CMS tool set served over direct RPC: the post CRUD
/// operations plus site info, with the same names and schemas the full MCP
/// path would expose.
pub fn build_cms_fallback_tools(endpoint: Arc<RpcEndpoint>) -> ToolSet {
    let mut set = ToolSet::new();

    let direct = |method: &str| ToolBackend::DirectRpc {
        endpoint: Arc::clone(&endpoint),
        method: method.to_string(),
    };

    set.insert(
        AdaptedTool::new(
            "cms--create-post",
            adapter::CREATE_POST_DESCRIPTION,
            adapter::create_post_schema(),
            direct("cms--create-post"),
        )
        .with_check(ArgCheck::CreatePost),
    );
    set.insert(AdaptedTool::new(
        "cms--update-post",
        "Update an existing post on the CMS.",
        adapter::update_post_schema(),
        direct("cms--update-post"),
    ));
    set.insert(AdaptedTool::new(
        "cms--get-post",
        "Fetch a single post from the CMS by id.",
        adapter::get_post_schema(),
        direct("cms--get-post"),
    ));
    set.insert(AdaptedTool::new(
        "cms--list-posts",
        "List posts on the CMS, optionally filtered by status.",
        adapter::list_posts_schema(),
        direct("cms--list-posts"),
    ));
    set.insert(AdaptedTool::new(
        "cms--get-site-info",
        "Get information about the connected CMS site.",
        adapter::passthrough_schema(),
        direct("cms--get-site-info"),
    ));

    set
}
