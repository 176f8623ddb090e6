//! Error types for the think core.
//!
//! Every failure the config store, the providers and the dispatcher can
//! produce is a `ThinkError` variant, so callers can tell them apart
//! without parsing messages.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThinkError {
    #[error("Unknown provider: {0}. Supported providers: openai, anthropic")]
    UnknownProvider(String),

    #[error(
        "No API key found for provider '{provider}'. Please provide an API key with --key \
         or run 'think --config' to set up."
    )]
    MissingApiKey { provider: String },

    #[error("Provider '{provider}' does not support streaming responses")]
    UnsupportedOperation { provider: String },

    /// Any failure surfaced by a vendor transport (HTTP, auth, rate limit, decoding).
    #[error("{provider} error: {message}")]
    Provider { provider: String, message: String },

    #[error("No input provided. Provide a prompt or pipe content.")]
    MissingInput,

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to write config file {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config for {}: {source}", .path.display())]
    ConfigSerialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },
}

impl ThinkError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = ThinkError> = std::result::Result<T, E>;
