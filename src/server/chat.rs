//! The chat endpoint
//!
//! Accepts a conversation, assembles the per-request tool set, and relays a
//! model completion as server-sent events, running tool calls between model
//! turns until the model answers in plain text or the step budget runs out.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::llm::{CompletionRequest, Message, Role, StreamChunk};
use crate::mcp::ProviderKind;
use crate::server::AppState;
use crate::tools::{self, Intent, RpcEndpoint, ToolSet, adapter, fallback, intent};

/// Upper bound on model turns per request; each tool round consumes one
pub const MAX_TOOL_STEPS: usize = 5;

/// Buffer size for the outgoing event channel
const EVENT_CHANNEL_SIZE: usize = 64;

const SYSTEM_PROMPT: &str = "\
You are a helpful assistant for a content team. You can search indexed content, \
browse the asset library, and manage posts on the connected CMS.

CRITICAL INSTRUCTIONS for search tools:
- Use the search tool to find relevant documents before answering questions about \
indexed content. Use fetch to retrieve the full text of a specific result by id.
- Cite what you found; do not invent documents.

CRITICAL INSTRUCTIONS for asset tools:
- Use search-assets to find images, videos, and files in the asset library. Pass \
the user's description as the query.
- When the user wants to attach an asset to a post, first find it with the asset \
tools, then pass both its delivery URL and public id to the post tool.

CRITICAL INSTRUCTIONS for CMS tools:
- Use cms--create-post to create posts. Title and content are required. Default \
to draft status unless the user explicitly asks to publish.
- When embedding an asset, always provide asset_url together with asset_public_id.
- Never fabricate post ids; look them up with cms--list-posts or cms--get-post.

Answer concisely. Only call tools when they are needed to answer.";

/// Incoming request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

/// A conversation entry as clients send it
#[derive(Debug, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: WireContent,
}

/// Message content: a plain string or an array of typed parts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Debug, Deserialize)]
pub struct WirePart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl WireContent {
    fn as_text(&self) -> String {
        match self {
            WireContent::Text(s) => s.clone(),
            WireContent::Parts(parts) => parts
                .iter()
                .filter(|p| p.kind == "text")
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Events relayed to the client over SSE
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Text { text: String },
    ToolCall { id: String, name: String },
    ToolResult { id: String, name: String, content: String, is_error: bool },
    Error { message: String },
    Done,
}

/// The conversation after normalization: model messages plus the system
/// instruction with client-supplied system entries folded in
struct Conversation {
    system: String,
    messages: Vec<Message>,
    latest_user_text: String,
}

fn normalize(request: ChatRequest) -> Option<Conversation> {
    let mut system = SYSTEM_PROMPT.to_string();
    let mut messages = Vec::new();
    let mut latest_user_text = String::new();

    for entry in request.messages {
        let text = entry.content.as_text();
        match entry.role.as_str() {
            "system" => {
                if !text.is_empty() {
                    system.push_str("\n\n");
                    system.push_str(&text);
                }
            }
            "user" => {
                latest_user_text = text.clone();
                messages.push(Message::user(text));
            }
            "assistant" => messages.push(Message::assistant(text)),
            other => debug!("[chat] dropping message with unknown role {}", other),
        }
    }

    if messages.iter().any(|m| m.role == Role::User) {
        Some(Conversation {
            system,
            messages,
            latest_user_text,
        })
    } else {
        None
    }
}

/// Assemble the tool set for one request. The search provider is mandatory;
/// asset and CMS groups join only when the intent router selects them (or
/// routing is disabled). Merge order fixes precedence: search, assets, cms,
/// weather.
async fn assemble_tools(state: &AppState, latest_user_text: &str) -> Option<ToolSet> {
    let search_client = state.registry.get_or_connect(ProviderKind::Search).await?;

    let wanted = if state.config.server.intent_routing {
        intent::detect(latest_user_text)
    } else {
        Intent::all()
    };

    let mut set = ToolSet::new();

    match search_client.list_tools().await {
        Ok(remote) => set.merge(adapter::build_search_tools(&search_client, &remote)),
        Err(e) => warn!("[chat] search discovery failed: {}", e),
    }

    if wanted.assets
        && let Some(client) = state.registry.get_or_connect(ProviderKind::Assets).await
    {
        match client.list_tools().await {
            Ok(remote) => set.merge(adapter::build_asset_tools(&client, &remote)),
            Err(e) => warn!("[chat] asset discovery failed: {}", e),
        }
    }

    if wanted.cms {
        let mut cms_set = ToolSet::new();
        if let Some(client) = state.registry.get_or_connect(ProviderKind::Cms).await {
            match client.list_tools().await {
                Ok(remote) => cms_set = adapter::build_cms_tools(&client, &remote),
                Err(e) => warn!("[chat] cms discovery failed: {}", e),
            }
        }

        if cms_set.is_empty()
            && let (Some(url), Some(token)) =
                (&state.config.providers.cms.url, &state.config.providers.cms.token)
        {
            match RpcEndpoint::new(url.clone(), token.clone()) {
                Ok(endpoint) => {
                    debug!("[chat] using direct-RPC fallback for cms tools");
                    cms_set = fallback::build_cms_fallback_tools(Arc::new(endpoint));
                }
                Err(e) => warn!("[chat] cms fallback unavailable: {}", e),
            }
        }

        set.merge(cms_set);
    }

    set.merge(tools::builtin_tools());
    set.expand_aliases(tools::EXTRA_ALIASES);

    Some(set)
}

/// POST /api/chat
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let Some(conversation) = normalize(request) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "at least one user message is required" })),
        )
            .into_response();
    };

    let Some(tool_set) = assemble_tools(&state, &conversation.latest_user_text).await else {
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": "search provider unavailable" })),
        )
            .into_response();
    };

    debug!("[chat] exposing tools: {:?}", tool_set.names());

    let (event_tx, event_rx) = mpsc::channel::<ChatEvent>(EVENT_CHANNEL_SIZE);
    tokio::spawn(run_loop(state, conversation, tool_set, event_tx));

    let stream = ReceiverStream::new(event_rx)
        .map(|event| Event::default().json_data(&event))
        .map(|event| Ok::<_, Infallible>(event.unwrap_or_else(|_| Event::default())));

    (
        [
            ("cache-control", "no-cache"),
            ("x-accel-buffering", "no"),
        ],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

/// Drive the model/tool loop, emitting events as they happen. Ends with a
/// `done` event unless the client went away first.
async fn run_loop(
    state: Arc<AppState>,
    conversation: Conversation,
    tool_set: ToolSet,
    event_tx: mpsc::Sender<ChatEvent>,
) {
    let Conversation {
        system,
        mut messages,
        ..
    } = conversation;
    let definitions = tool_set.to_llm_definitions();

    for step in 0..MAX_TOOL_STEPS {
        let mut request = CompletionRequest::new(&system)
            .with_tools(definitions.clone())
            .with_max_tokens(state.config.llm.max_tokens);
        request.messages = messages.clone();

        let (chunk_tx, mut chunk_rx) = mpsc::channel::<StreamChunk>(EVENT_CHANNEL_SIZE);
        let forwarder = {
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                while let Some(chunk) = chunk_rx.recv().await {
                    let event = match chunk {
                        StreamChunk::Text(text) => Some(ChatEvent::Text { text }),
                        StreamChunk::ToolCall { id, name } => {
                            Some(ChatEvent::ToolCall { id, name })
                        }
                        // Input deltas are accumulated by the stream parser;
                        // clients only see the executed result.
                        StreamChunk::ToolInput { .. } => None,
                        StreamChunk::Done => None,
                        StreamChunk::Error(message) => Some(ChatEvent::Error { message }),
                    };
                    if let Some(event) = event
                        && event_tx.send(event).await.is_err()
                    {
                        break;
                    }
                }
            })
        };

        let response = match state.llm.stream(request, chunk_tx).await {
            Ok(response) => response,
            Err(e) => {
                error!("[chat] model call failed at step {}: {}", step, e);
                let _ = event_tx
                    .send(ChatEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                break;
            }
        };
        let _ = forwarder.await;

        messages.push(Message::blocks(
            Role::Assistant,
            response.to_assistant_blocks(),
        ));

        if !response.stop_reason.needs_continuation() || response.tool_calls.is_empty() {
            break;
        }

        let mut result_blocks = Vec::with_capacity(response.tool_calls.len());
        for call in &response.tool_calls {
            let result = tool_set.execute(call).await;
            let event = ChatEvent::ToolResult {
                id: call.id.clone(),
                name: call.name.clone(),
                content: result.content.clone(),
                is_error: result.is_error,
            };
            if event_tx.send(event).await.is_err() {
                return;
            }
            result_blocks.push(result.to_block());
        }
        messages.push(Message::blocks(Role::User, result_blocks));
    }

    let _ = event_tx.send(ChatEvent::Done).await;
}
