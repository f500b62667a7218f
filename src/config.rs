//! Configuration management for Lectern

use std::env;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::catalog::PaperCatalog;
use crate::error::BootstrapError;
use crate::search::{HostBridge, HttpBridge, OllamaBridge, DEFAULT_CONTEXT_BUDGET};
use crate::viewer::thumbnails::{ThumbnailConfig, DEFAULT_LOOKAHEAD_MARGIN, DEFAULT_THUMBNAIL_WIDTH};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub viewer: ViewerConfig,
    pub thumbnails: ThumbnailSettings,
    pub bridge: BridgeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    /// Path the viewer router is nested under
    pub mount: String,
    /// Catalog id loaded at startup
    pub default_paper: String,
    /// `id=source` overrides merged over the built-in catalog
    pub catalog: Option<String>,
    pub context_budget: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailSettings {
    pub width: u32,
    pub margin: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub provider: BridgeProvider,
    pub url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeProvider {
    None,
    Http,
    Ollama,
}

impl std::str::FromStr for BridgeProvider {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(BridgeProvider::None),
            "http" => Ok(BridgeProvider::Http),
            "ollama" => Ok(BridgeProvider::Ollama),
            other => Err(BootstrapError::UnknownBridgeProvider(other.to_string())),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            viewer: ViewerConfig {
                mount: "/viewer".to_string(),
                default_paper: "meta-symbolic-language".to_string(),
                catalog: None,
                context_budget: DEFAULT_CONTEXT_BUDGET,
            },
            thumbnails: ThumbnailSettings {
                width: DEFAULT_THUMBNAIL_WIDTH,
                margin: DEFAULT_LOOKAHEAD_MARGIN,
            },
            bridge: BridgeConfig {
                provider: BridgeProvider::None,
                url: None,
                model: "llama3".to_string(),
                timeout_secs: 120,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, BootstrapError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing or unparsable numbers fall back
    /// to their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BootstrapError> {
        let defaults = Config::default();
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST", &defaults.server.host),
                port: var("SERVER_PORT", "3000").parse().unwrap_or(defaults.server.port),
            },
            viewer: ViewerConfig {
                mount: var("VIEWER_MOUNT", &defaults.viewer.mount),
                default_paper: var("VIEWER_DEFAULT_PAPER", &defaults.viewer.default_paper),
                catalog: lookup("VIEWER_CATALOG"),
                context_budget: var("CONTEXT_BUDGET", "8000")
                    .parse()
                    .unwrap_or(defaults.viewer.context_budget),
            },
            thumbnails: ThumbnailSettings {
                width: var("THUMBNAIL_WIDTH", "150")
                    .parse::<u32>()
                    .ok()
                    .filter(|width| *width > 0)
                    .unwrap_or(defaults.thumbnails.width),
                margin: var("THUMBNAIL_MARGIN", "100")
                    .parse::<f64>()
                    .ok()
                    .filter(|margin| margin.is_finite() && *margin >= 0.0)
                    .unwrap_or(defaults.thumbnails.margin),
            },
            bridge: BridgeConfig {
                provider: var("BRIDGE_PROVIDER", "none").parse()?,
                url: lookup("BRIDGE_URL").filter(|url| !url.trim().is_empty()),
                model: var("BRIDGE_MODEL", &defaults.bridge.model),
                timeout_secs: var("BRIDGE_TIMEOUT_SECS", "120")
                    .parse()
                    .unwrap_or(defaults.bridge.timeout_secs),
            },
        })
    }

    pub fn catalog(&self) -> PaperCatalog {
        match &self.viewer.catalog {
            Some(entries) => PaperCatalog::builtin().with_overrides(entries),
            None => PaperCatalog::builtin(),
        }
    }

    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            width: self.thumbnails.width,
            lookahead_margin: self.thumbnails.margin,
            ..ThumbnailConfig::default()
        }
    }
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Host bridge for the configured provider, `None` when search is off
    pub fn build(&self) -> Result<Option<Arc<dyn HostBridge>>, BootstrapError> {
        match self.provider {
            BridgeProvider::None => Ok(None),
            BridgeProvider::Http => {
                let url = self.url.as_deref().ok_or(BootstrapError::MissingBridgeUrl)?;
                Ok(Some(Arc::new(HttpBridge::new(url))))
            }
            BridgeProvider::Ollama => {
                let bridge = match self.url.as_deref() {
                    Some(url) => OllamaBridge::new(url, &self.model),
                    None => OllamaBridge::new("http://localhost:11434", &self.model),
                };
                Ok(Some(Arc::new(bridge)))
            }
        }
    }
}
