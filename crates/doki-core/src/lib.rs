//! DOKI Core: server configuration and shared error types.

pub mod config;
pub mod error;

pub use config::DokiConfig;
pub use error::{Error, Result};
