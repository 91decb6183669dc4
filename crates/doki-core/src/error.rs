//! Error types for DOKI.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Provider returned {status}: {body}")]
    Provider { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, Error>;
