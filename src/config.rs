use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// When enabled, the asset and CMS tool groups are only exposed to the
    /// model when the latest user message matches their keyword sets.
    pub intent_routing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            intent_routing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 8192,
            timeout_ms: 300000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub search: SearchProviderConfig,
    pub assets: AssetProviderConfig,
    pub cms: CmsProviderConfig,
}

/// Search/retrieval provider - the only mandatory dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchProviderConfig {
    pub url: String,
}

impl Default for SearchProviderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/mcp".to_string(),
        }
    }
}

/// Digital-asset-management provider. Disabled unless a URL is configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetProviderConfig {
    pub url: Option<String>,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl AssetProviderConfig {
    pub fn enabled(&self) -> bool {
        self.url.is_some()
    }
}

/// Content-management provider. The direct JSON-RPC fallback only activates
/// when both the URL and the token are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsProviderConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

impl CmsProviderConfig {
    pub fn enabled(&self) -> bool {
        self.url.is_some() && self.token.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain, then apply env overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.apply_env();
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir
                .join(project_name)
                .join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!(
                            "Failed to load config from {}: {}",
                            primary_config.display(),
                            e
                        );
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!(
                        "Failed to load config from {}: {}",
                        fallback_config.display(),
                        e
                    );
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Environment variables win over file values. Absence of the optional
    /// providers' variables leaves them disabled.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("SEARCH_MCP_URL") {
            self.providers.search.url = url;
        }
        if let Ok(url) = std::env::var("ASSETS_MCP_URL") {
            self.providers.assets.url = Some(url);
        }
        if let Ok(v) = std::env::var("ASSETS_CLOUD_NAME") {
            self.providers.assets.cloud_name = Some(v);
        }
        if let Ok(v) = std::env::var("ASSETS_API_KEY") {
            self.providers.assets.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("ASSETS_API_SECRET") {
            self.providers.assets.api_secret = Some(v);
        }
        if let Ok(url) = std::env::var("CMS_MCP_URL") {
            self.providers.cms.url = Some(url);
        }
        if let Ok(token) = std::env::var("CMS_MCP_TOKEN") {
            self.providers.cms.token = Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert!(config.server.intent_routing);
        assert_eq!(config.providers.search.url, "http://localhost:8080/mcp");
        assert!(!config.providers.assets.enabled());
        assert!(!config.providers.cms.enabled());
    }

    #[test]
    fn test_cms_enabled_requires_url_and_token() {
        let mut cms = CmsProviderConfig::default();
        assert!(!cms.enabled());

        cms.url = Some("https://cms.example.com/mcp".to_string());
        assert!(!cms.enabled());

        cms.token = Some("secret".to_string());
        assert!(cms.enabled());
    }

    #[test]
    fn test_assets_enabled_requires_url() {
        let mut assets = AssetProviderConfig::default();
        assert!(!assets.enabled());
        assets.url = Some("https://assets.example.com/mcp".to_string());
        assert!(assets.enabled());
    }

    #[test]
    fn test_load_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chatrelay.yml");
        std::fs::write(
            &path,
            r#"
server:
  bind: "0.0.0.0:8000"
  intent_routing: false
providers:
  cms:
    url: "https://cms.example.com/mcp"
    token: "tok"
"#,
        )
        .unwrap();

        let config = Config::load_file_chain(Some(&path)).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert!(!config.server.intent_routing);
        assert!(config.providers.cms.enabled());
        // Untouched sections keep defaults
        assert_eq!(config.llm.max_tokens, 8192);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/chatrelay.yml");
        assert!(Config::load_file_chain(Some(&path)).is_err());
    }
}
