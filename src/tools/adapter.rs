//! Per-provider schema adapters
//!
//! Provider tool catalogs are advisory only: each group is rebuilt against a
//! fixed name list with hand-authored schemas where argument shape matters,
//! and the permissive object schema everywhere else. A tool the provider
//! did not report is simply not exposed.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::mcp::{McpClient, RemoteTool};
use crate::tools::definition::{AdaptedTool, ArgCheck, ArgMap, ToolBackend, ToolSet};

pub const CREATE_POST_DESCRIPTION: &str = "Create a new post on the CMS. Provide title and \
    content; optionally set status and attach an asset by URL and public id.";

/// The asset tools the gateway is willing to expose, by provider name
const ASSET_TOOL_NAMES: &[&str] = &[
    "search-assets",
    "list-images",
    "list-videos",
    "list-files",
    "get-asset-details",
    "list-tags",
    "visual-search-assets",
    "transform-asset",
    "get-tx-reference",
];

/// The CMS tools the gateway is willing to expose, by provider name
const CMS_TOOL_NAMES: &[&str] = &[
    "cms--get-site-info",
    "cms--purge-cache",
    "cms--create-post",
    "cms--update-post",
    "cms--get-post",
    "cms--list-posts",
    "cms--index-asset",
    "cms--bulk-index-assets",
];

/// Schema accepted by tools whose arguments are forwarded untouched. The
/// model's function-calling interface requires an object schema even when
/// the provider validates server-side.
pub fn passthrough_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": true
    })
}

pub fn search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Free-text search query"
            },
            "filter": {
                "type": "string",
                "description": "Optional filter expression to narrow results"
            },
            "limit": {
                "type": "integer",
                "description": "Maximum number of results to return"
            },
            "offset": {
                "type": "integer",
                "description": "Number of results to skip"
            }
        },
        "required": ["query"]
    })
}

pub fn fetch_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "string",
                "description": "Identifier of the document to fetch"
            }
        },
        "required": ["id"]
    })
}

pub fn asset_search_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Free-text description of the assets to find"
            },
            "expression": {
                "type": "string",
                "description": "Provider search expression; takes precedence over query"
            },
            "max_results": {
                "type": "integer",
                "description": "Maximum number of assets to return"
            },
            "next_cursor": {
                "type": "string",
                "description": "Cursor from a previous page of results"
            }
        }
    })
}

pub fn create_post_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "Post title"
            },
            "content": {
                "type": "string",
                "description": "Post body, HTML or markup accepted by the CMS"
            },
            "status": {
                "type": "string",
                "enum": ["publish", "draft", "pending", "private"],
                "description": "Publication status; defaults to draft"
            },
            "asset_url": {
                "type": "string",
                "description": "Delivery URL of an asset to embed as the featured image"
            },
            "asset_public_id": {
                "type": "string",
                "description": "Asset public id; requires asset_url to also be set"
            }
        },
        "required": ["title", "content"]
    })
}

pub fn update_post_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "integer",
                "description": "Id of the post to update"
            },
            "title": { "type": "string" },
            "content": { "type": "string" },
            "status": {
                "type": "string",
                "enum": ["publish", "draft", "pending", "private"]
            }
        },
        "required": ["id"]
    })
}

pub fn get_post_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "integer",
                "description": "Id of the post to fetch"
            }
        },
        "required": ["id"]
    })
}

pub fn list_posts_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "status": {
                "type": "string",
                "enum": ["publish", "draft", "pending", "private"],
                "description": "Only list posts with this status"
            },
            "per_page": {
                "type": "integer",
                "description": "Number of posts per page"
            },
            "page": {
                "type": "integer",
                "description": "Page number, starting at 1"
            }
        }
    })
}

fn describe(remote: &RemoteTool, default: &str) -> String {
    if remote.description.is_empty() {
        default.to_string()
    } else {
        remote.description.clone()
    }
}

fn remote_backend(client: &Arc<McpClient>, name: &str) -> ToolBackend {
    ToolBackend::McpRemote {
        client: Arc::clone(client),
        remote_name: name.to_string(),
    }
}

/// Wrap the search provider's catalog. Only `search` and `fetch` are
/// exposed, each with a stable hand-authored schema.
pub fn build_search_tools(client: &Arc<McpClient>, remote: &[RemoteTool]) -> ToolSet {
    let mut set = ToolSet::new();

    for tool in remote {
        match tool.name.as_str() {
            "search" => set.insert(AdaptedTool::new(
                "search",
                describe(tool, "Search the indexed content for relevant documents."),
                search_schema(),
                remote_backend(client, "search"),
            )),
            "fetch" => set.insert(AdaptedTool::new(
                "fetch",
                describe(tool, "Fetch the full content of a document by id."),
                fetch_schema(),
                remote_backend(client, "fetch"),
            )),
            _ => {}
        }
    }

    set
}

/// Wrap the asset provider's catalog against the fixed name list.
/// `search-assets` gets the hand-authored schema and the request-envelope
/// argument mapper; every other exposed tool is a passthrough.
pub fn build_asset_tools(client: &Arc<McpClient>, remote: &[RemoteTool]) -> ToolSet {
    let mut set = ToolSet::new();

    for tool in remote {
        if !ASSET_TOOL_NAMES.contains(&tool.name.as_str()) {
            continue;
        }

        let adapted = if tool.name == "search-assets" {
            AdaptedTool::new(
                "search-assets",
                describe(tool, "Search the asset library by free text or expression."),
                asset_search_schema(),
                remote_backend(client, "search-assets"),
            )
            .with_map(ArgMap::AssetSearch)
        } else {
            AdaptedTool::new(
                tool.name.clone(),
                describe(tool, "Asset management operation; pass any object."),
                passthrough_schema(),
                remote_backend(client, &tool.name),
            )
        };

        set.insert(adapted);
    }

    set
}

/// Wrap the CMS provider's catalog against the fixed name list, with
/// hand-authored schemas for the post CRUD operations and create-post
/// validation at the boundary.
pub fn build_cms_tools(client: &Arc<McpClient>, remote: &[RemoteTool]) -> ToolSet {
    let mut set = ToolSet::new();

    for tool in remote {
        if !CMS_TOOL_NAMES.contains(&tool.name.as_str()) {
            continue;
        }

        let adapted = match tool.name.as_str() {
            "cms--create-post" => AdaptedTool::new(
                "cms--create-post",
                describe(tool, CREATE_POST_DESCRIPTION),
                create_post_schema(),
                remote_backend(client, "cms--create-post"),
            )
            .with_check(ArgCheck::CreatePost),
            "cms--update-post" => AdaptedTool::new(
                "cms--update-post",
                describe(tool, "Update an existing post on the CMS."),
                update_post_schema(),
                remote_backend(client, "cms--update-post"),
            ),
            "cms--get-post" => AdaptedTool::new(
                "cms--get-post",
                describe(tool, "Fetch a single post from the CMS by id."),
                get_post_schema(),
                remote_backend(client, "cms--get-post"),
            ),
            "cms--list-posts" => AdaptedTool::new(
                "cms--list-posts",
                describe(tool, "List posts on the CMS, optionally filtered by status."),
                list_posts_schema(),
                remote_backend(client, "cms--list-posts"),
            ),
            other => AdaptedTool::new(
                other,
                describe(tool, "CMS operation; pass any object."),
                passthrough_schema(),
                remote_backend(client, other),
            ),
        };

        set.insert(adapted);
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(name: &str) -> RemoteTool {
        RemoteTool {
            name: name.to_string(),
            description: String::new(),
            input_schema: Value::Null,
        }
    }

    fn remote_with_description(name: &str, description: &str) -> RemoteTool {
        RemoteTool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: Value::Null,
        }
    }

    #[test]
    fn test_search_schema_requires_query() {
        let schema = search_schema();
        assert_eq!(schema["required"], json!(["query"]));
        assert!(schema["properties"]["filter"].is_object());
        assert!(schema["properties"]["limit"].is_object());
        assert!(schema["properties"]["offset"].is_object());
    }

    #[test]
    fn test_fetch_schema_requires_id() {
        assert_eq!(fetch_schema()["required"], json!(["id"]));
    }

    #[test]
    fn test_create_post_schema_shape() {
        let schema = create_post_schema();
        assert_eq!(schema["required"], json!(["title", "content"]));
        let status_values = &schema["properties"]["status"]["enum"];
        assert_eq!(
            *status_values,
            json!(["publish", "draft", "pending", "private"])
        );
        assert!(schema["properties"]["asset_url"].is_object());
        assert!(schema["properties"]["asset_public_id"].is_object());
    }

    #[test]
    fn test_passthrough_schema_is_permissive_object() {
        let schema = passthrough_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], true);
    }

    #[test]
    fn test_describe_prefers_provider_description() {
        let tool = remote_with_description("search", "provider says");
        assert_eq!(describe(&tool, "default"), "provider says");
        assert_eq!(describe(&remote("search"), "default"), "default");
    }

    #[test]
    fn test_asset_name_list_is_closed() {
        assert_eq!(ASSET_TOOL_NAMES.len(), 9);
        assert!(ASSET_TOOL_NAMES.contains(&"search-assets"));
        assert!(!ASSET_TOOL_NAMES.contains(&"delete-everything"));
    }

    #[test]
    fn test_cms_name_list_is_closed() {
        assert_eq!(CMS_TOOL_NAMES.len(), 8);
        assert!(CMS_TOOL_NAMES.iter().all(|n| n.starts_with("cms--")));
    }
}
