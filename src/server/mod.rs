//! HTTP surface - the chat endpoint and health check

pub mod chat;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use log::info;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::error::Result;
use crate::llm::LlmClient;
use crate::mcp::ProviderRegistry;

/// Shared state for the HTTP handlers
pub struct AppState {
    pub config: Config,
    pub registry: ProviderRegistry,
    pub llm: Arc<dyn LlmClient>,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn LlmClient>) -> Self {
        let registry = ProviderRegistry::new(config.providers.clone());
        Self {
            config,
            registry,
            llm,
        }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat::handle))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Bind and serve until the process is stopped
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let bind = state.config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("[server] listening on {}", bind);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::llm::{CompletionRequest, CompletionResponse, StreamChunk};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct NeverClient;

    #[async_trait]
    impl LlmClient for NeverClient {
        async fn complete(&self, _: CompletionRequest) -> crate::error::Result<CompletionResponse> {
            unreachable!()
        }

        async fn stream(
            &self,
            _: CompletionRequest,
            _: mpsc::Sender<StreamChunk>,
        ) -> crate::error::Result<CompletionResponse> {
            unreachable!()
        }

        fn model(&self) -> &str {
            "test-model"
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_healthz() {
        let state = Arc::new(AppState::new(Config::default(), Arc::new(NeverClient)));
        let app = router(state);

        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let state = Arc::new(AppState::new(Config::default(), Arc::new(NeverClient)));
        let app = router(state);

        let response = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
