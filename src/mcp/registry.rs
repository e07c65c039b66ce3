//! Lazily-initialized registry of provider connections
//!
//! Each provider is connected at most once per process lifetime. The
//! outcome of that first attempt, success or failure, is cached and reused
//! by every subsequent request; there is no invalidation and no teardown.
//! A lost initialization race costs one extra connect attempt, never
//! inconsistent state.

use std::sync::Arc;

use log::warn;
use tokio::sync::OnceCell;

use crate::config::ProvidersConfig;
use crate::mcp::client::McpClient;

/// The three tool providers the gateway knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Search/retrieval - the only mandatory dependency
    Search,
    /// Digital-asset management - optional
    Assets,
    /// Content management - optional, has a direct-RPC fallback
    Cms,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Search => "search",
            ProviderKind::Assets => "assets",
            ProviderKind::Cms => "cms",
        }
    }
}

type ConnectionSlot = OnceCell<Option<Arc<McpClient>>>;

/// Process-wide provider connection registry
pub struct ProviderRegistry {
    config: ProvidersConfig,
    search: ConnectionSlot,
    assets: ConnectionSlot,
    cms: ConnectionSlot,
}

impl ProviderRegistry {
    pub fn new(config: ProvidersConfig) -> Self {
        Self {
            config,
            search: OnceCell::new(),
            assets: OnceCell::new(),
            cms: OnceCell::new(),
        }
    }

    /// Get the cached connection for a provider, connecting on first use.
    ///
    /// Returns None for providers that are disabled by configuration or
    /// whose first connection attempt failed.
    pub async fn get_or_connect(&self, kind: ProviderKind) -> Option<Arc<McpClient>> {
        let slot = match kind {
            ProviderKind::Search => &self.search,
            ProviderKind::Assets => &self.assets,
            ProviderKind::Cms => &self.cms,
        };

        slot.get_or_init(|| self.connect(kind)).await.clone()
    }

    async fn connect(&self, kind: ProviderKind) -> Option<Arc<McpClient>> {
        let (url, headers) = match kind {
            ProviderKind::Search => (self.config.search.url.clone(), Vec::new()),
            ProviderKind::Assets => {
                let url = self.config.assets.url.clone()?;
                let mut headers = Vec::new();
                if let Some(v) = &self.config.assets.cloud_name {
                    headers.push(("x-asset-cloud-name".to_string(), v.clone()));
                }
                if let Some(v) = &self.config.assets.api_key {
                    headers.push(("x-asset-api-key".to_string(), v.clone()));
                }
                if let Some(v) = &self.config.assets.api_secret {
                    headers.push(("x-asset-api-secret".to_string(), v.clone()));
                }
                (url, headers)
            }
            ProviderKind::Cms => {
                let url = self.config.cms.url.clone()?;
                let token = self.config.cms.token.clone()?;
                (url, vec![("x-mcp-token".to_string(), token)])
            }
        };

        match McpClient::connect(kind.as_str(), url, headers).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!("[mcp] {} provider unavailable: {}", kind.as_str(), e);
                None
            }
        }
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("search_initialized", &self.search.initialized())
            .field("assets_initialized", &self.assets.initialized())
            .field("cms_initialized", &self.cms.initialized())
            .finish()
    }
}
