//! Shared application state.

use doki_chat::{ChatRelay, LLMConfig};
use doki_core::DokiConfig;

/// Shared application state accessible from all route handlers.
///
/// Immutable after startup; requests share nothing mutable.
pub struct AppState {
    pub relay: ChatRelay,
}

impl AppState {
    /// Load the provider configuration named by `config`.
    pub fn new(config: &DokiConfig) -> Self {
        let llm_config = LLMConfig::load(&config.llm_config_file);
        Self::with_relay(ChatRelay::new(llm_config))
    }

    pub fn with_relay(relay: ChatRelay) -> Self {
        Self { relay }
    }
}
