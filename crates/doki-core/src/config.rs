//! Server configuration.

use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// Top-level DOKI server configuration.
#[derive(Debug, Clone)]
pub struct DokiConfig {
    /// Interface to bind.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Root data directory (e.g., `data/`).
    pub data_dir: PathBuf,
    /// Provider configuration (`data/llm-config.json`). Optional on disk.
    pub llm_config_file: PathBuf,
}

impl DokiConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Self {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`DokiConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(data_dir: impl AsRef<Path>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid PORT value {:?}, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let data_dir = data_dir.as_ref().to_path_buf();

        Self {
            host,
            port,
            llm_config_file: data_dir.join("llm-config.json"),
            data_dir,
        }
    }

    /// Socket address string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
