//! Error type shared by the core library.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BloxError {
    #[error("local store: {0}")]
    Store(#[from] sled::Error),

    #[error("decode {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("encode: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("config: {0}")]
    Config(#[from] config::ConfigError),

    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("unknown integration: {0}")]
    UnknownIntegration(String),

    #[error("integration is not connected: {0}")]
    NotConnected(String),

    #[error("invalid field: {0}")]
    InvalidField(String),
}

pub type Result<T> = std::result::Result<T, BloxError>;
