//! Provider configuration: file first, environment as fallback.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::framing::StreamFormat;

pub const PROVIDER_NAME: &str = "deepseek";
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const MODEL: &str = "deepseek-chat";
pub const TEMPERATURE: f64 = 0.7;
pub const MAX_TOKENS: u32 = 1000;

/// Stored provider configuration (optionally persisted as llm-config.json).
///
/// Model and sampling parameters are constants and are not read from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub stream_format: StreamFormat,
    /// Path the config was loaded from.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.into(),
            stream_format: StreamFormat::default(),
            config_path: PathBuf::new(),
        }
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`LLMConfig::load`], reading variables through `lookup`.
    pub fn load_with<F>(config_path: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: LLMConfig = match std::fs::read_to_string(config_path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(parsed) => {
                    info!("Loaded LLM config from {}", config_path.display());
                    parsed
                }
                Err(e) => {
                    warn!("Ignoring malformed {}: {}", config_path.display(), e);
                    LLMConfig::default()
                }
            },
            Err(_) => LLMConfig::default(),
        };

        config.config_path = config_path.to_path_buf();

        // Env var as fallback for the API key
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            config.api_key = lookup("DEEPSEEK_API_KEY").filter(|k| !k.is_empty());
        }
        if let Some(url) = lookup("DEEPSEEK_BASE_URL").filter(|u| !u.is_empty()) {
            config.base_url = url;
        }
        if let Some(raw) = lookup("DOKI_STREAM_FORMAT") {
            match raw.parse() {
                Ok(format) => config.stream_format = format,
                Err(e) => warn!("{}; keeping {}", e, config.stream_format),
            }
        }

        config
    }

    /// Whether an API key is available.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Chat completions endpoint under the configured base URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
