//! Adapted tool definitions and the per-request tool set
//!
//! Raw provider tools are wrapped into `AdaptedTool`s: a stable name, a
//! declared input schema, and a validated invocation path. The backend is a
//! discriminated union over the known invocation routes rather than a
//! trusted opaque callable.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{RelayError, Result};
use crate::llm::{ToolCall, ToolDefinition, ToolResult};
use crate::mcp::McpClient;
use crate::tools::fallback::RpcEndpoint;
use crate::tools::weather;

/// Separator used by providers in qualified tool names
pub const NAME_SEPARATOR: char = '-';

/// How an adapted tool reaches its implementation
pub enum ToolBackend {
    /// Forward to a connected MCP provider under the provider's own name
    McpRemote {
        client: Arc<McpClient>,
        remote_name: String,
    },
    /// Issue a single direct JSON-RPC request to a provider endpoint
    DirectRpc {
        endpoint: Arc<RpcEndpoint>,
        method: String,
    },
    /// Builtin utility tool, no remote call
    Weather,
}

/// Validation applied to arguments before any remote call is issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgCheck {
    #[default]
    None,
    /// create-post: an asset reference id requires its companion URL
    CreatePost,
}

impl ArgCheck {
    pub fn validate(&self, args: &Value) -> Result<()> {
        match self {
            ArgCheck::None => Ok(()),
            ArgCheck::CreatePost => {
                let has_id = args
                    .get("asset_public_id")
                    .and_then(|v| v.as_str())
                    .is_some_and(|s| !s.is_empty());
                let has_url = args
                    .get("asset_url")
                    .and_then(|v| v.as_str())
                    .is_some_and(|s| !s.is_empty());
                if has_id && !has_url {
                    return Err(RelayError::ToolArgs(
                        "asset_url is required to embed the image when asset_public_id is provided"
                            .to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Argument shaping applied after validation, before dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgMap {
    #[default]
    Identity,
    /// search-assets: fold query/expression into the provider's request envelope
    AssetSearch,
}

impl ArgMap {
    pub fn apply(&self, args: Value) -> Value {
        match self {
            ArgMap::Identity => args,
            ArgMap::AssetSearch => {
                let expression = args
                    .get("expression")
                    .or_else(|| args.get("query"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();

                let mut request = serde_json::Map::new();
                request.insert("expression".to_string(), Value::String(expression));
                if let Some(max) = args.get("max_results").filter(|v| !v.is_null()) {
                    request.insert("max_results".to_string(), max.clone());
                }
                if let Some(cursor) = args.get("next_cursor").filter(|v| !v.is_null()) {
                    request.insert("next_cursor".to_string(), cursor.clone());
                }

                serde_json::json!({ "request": request })
            }
        }
    }
}

/// A provider tool wrapped with a stable schema and validated invocation
pub struct AdaptedTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub backend: ToolBackend,
    pub check: ArgCheck,
    pub map: ArgMap,
}

impl AdaptedTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        backend: ToolBackend,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            backend,
            check: ArgCheck::None,
            map: ArgMap::Identity,
        }
    }

    pub fn with_check(mut self, check: ArgCheck) -> Self {
        self.check = check;
        self
    }

    pub fn with_map(mut self, map: ArgMap) -> Self {
        self.map = map;
        self
    }

    /// Validate, shape, and dispatch the arguments; the result is returned
    /// unchanged from the backend.
    pub async fn invoke(&self, args: Value) -> Result<String> {
        self.check.validate(&args)?;
        let args = self.map.apply(args);

        match &self.backend {
            ToolBackend::McpRemote {
                client,
                remote_name,
            } => client.call_tool(remote_name, args).await,
            ToolBackend::DirectRpc { endpoint, method } => {
                let result = endpoint.call(method, args).await?;
                Ok(stringify_result(result))
            }
            ToolBackend::Weather => Ok(weather::report(&args)),
        }
    }
}

fn stringify_result(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_default(),
    }
}

/// The active tool set for one request: unique exposed names mapped to
/// adapted tools, recomputed per request, never persisted.
#[derive(Default, Clone)]
pub struct ToolSet {
    tools: BTreeMap<String, Arc<AdaptedTool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tool: AdaptedTool) {
        self.tools.entry(tool.name.clone()).or_insert(Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<AdaptedTool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Merge another set in; existing entries always win.
    pub fn merge(&mut self, other: ToolSet) {
        for (name, tool) in other.tools {
            self.tools.entry(name).or_insert(tool);
        }
    }

    /// Register an underscore-joined alias for every name containing the
    /// separator, plus an explicit extra-alias table. Canonical names always
    /// win; an alias never overwrites an existing entry.
    pub fn expand_aliases(&mut self, extra: &[(&str, &str)]) {
        let canonical: Vec<(String, Arc<AdaptedTool>)> = self
            .tools
            .iter()
            .filter(|(name, _)| name.contains(NAME_SEPARATOR))
            .map(|(name, tool)| (name.replace(NAME_SEPARATOR, "_"), Arc::clone(tool)))
            .collect();

        for (alias, tool) in canonical {
            self.tools.entry(alias).or_insert(tool);
        }

        for (alias, canonical_name) in extra {
            if let Some(tool) = self.tools.get(*canonical_name).cloned() {
                self.tools.entry(alias.to_string()).or_insert(tool);
            }
        }
    }

    /// Definitions for the model, one per exposed name (aliases included)
    pub fn to_llm_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|(name, tool)| {
                ToolDefinition::new(
                    name.clone(),
                    tool.description.clone(),
                    tool.input_schema.clone(),
                )
            })
            .collect()
    }

    /// Execute a model tool call. Failures become error results so the model
    /// can react conversationally; they never abort the request.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.get(&call.name) else {
            return ToolResult::error(
                &call.id,
                RelayError::UnknownTool(call.name.clone()).to_string(),
            );
        };

        match tool.invoke(call.input.clone()).await {
            Ok(content) => ToolResult::success(&call.id, content),
            Err(e) => ToolResult::error(&call.id, e.to_string()),
        }
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet").field("names", &self.names()).finish()
    }
}
