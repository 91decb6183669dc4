//! DOKI chat relay.
//!
//! Prepends a language-specific health-assistant system instruction to a
//! caller-supplied conversation and streams the provider's completion back.
//! LLM calls go to an external OpenAI-compatible API.

pub mod config;
pub mod framing;
pub mod language;
pub mod providers;
pub mod relay;
pub mod types;

pub use config::LLMConfig;
pub use framing::StreamFormat;
pub use language::Language;
pub use relay::{build_messages, ChatRelay};
pub use types::*;
