//! LLM provider module.
//!
//! This module defines the `LlmProvider` trait that abstracts over the
//! supported vendors, and the factory that maps a provider name to an
//! implementation.
//!
//! Key concepts:
//! - **Trait**: each vendor has its own request/response format, but they
//!   all implement the same trait so the processor doesn't care
//! - **async_trait**: enables async methods on a trait used as `dyn LlmProvider`
//! - **Optional streaming**: `stream_response` has a default body that fails
//!   with `UnsupportedOperation`; vendors that can stream override it and
//!   report `supports_streaming() == true`
//! - **Closed set**: `ProviderKind` enumerates the vendors, so the factory
//!   matches exhaustively

pub mod anthropic;
mod http_errors;
pub mod openai;
mod sse;

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, ThinkError};
use crate::types::ResolvedRequest;

use anthropic::AnthropicProvider;
use openai::OpenAiProvider;

/// Returned when a call succeeds but carries no text.
pub const NO_RESPONSE: &str = "No response generated";

/// Sampling temperature used by every vendor. Not configurable.
pub const TEMPERATURE: f64 = 0.7;

/// Callback receiving streamed text fragments in arrival order.
pub type ChunkCallback<'a> = dyn FnMut(&str) + Send + 'a;

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Display name, used as the prefix of provider errors.
    fn name(&self) -> &str;

    /// Model used when the request names none.
    fn default_model(&self) -> &str;

    /// Send the prompt and wait for the whole answer.
    ///
    /// A successful response without text yields [`NO_RESPONSE`].
    async fn generate_response(&self, request: &ResolvedRequest) -> Result<String>;

    fn supports_streaming(&self) -> bool {
        false
    }

    /// Send the prompt and pass each text fragment to `on_chunk` as it
    /// arrives. Fragments already delivered stay delivered if the stream
    /// later fails.
    async fn stream_response(
        &self,
        _request: &ResolvedRequest,
        _on_chunk: &mut ChunkCallback<'_>,
    ) -> Result<()> {
        Err(ThinkError::UnsupportedOperation {
            provider: self.name().to_string(),
        })
    }

    /// The model for `request`, falling back to [`LlmProvider::default_model`].
    fn model_for<'r>(&'r self, request: &'r ResolvedRequest) -> &'r str {
        request.model().unwrap_or_else(|| self.default_model())
    }
}

/// The supported vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Anthropic];

    /// Name used on the command line and as the config key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => openai::PROVIDER_NAME,
            Self::Anthropic => anthropic::PROVIDER_NAME,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => openai::DEFAULT_MODEL,
            Self::Anthropic => anthropic::DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ThinkError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(ThinkError::UnknownProvider(name.to_string())),
        }
    }
}

/// Per-call transport settings for a provider instance.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    /// Endpoint base URL; `None` uses the vendor's public API.
    pub api_base: Option<String>,
    /// Overall request deadline; `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
}

fn build_client(kind: ProviderKind, timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| {
        ThinkError::provider(
            kind.display_name(),
            format!("Failed to initialize HTTP client: {}", e),
        )
    })
}

/// Create the provider named `name` (case-insensitive).
pub fn create_provider(name: &str, settings: &ProviderSettings) -> Result<Box<dyn LlmProvider>> {
    let kind: ProviderKind = name.parse()?;
    let client = build_client(kind, settings.timeout)?;
    let api_base = settings.api_base.clone();

    Ok(match kind {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(client, api_base)),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(client, api_base)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            "ANTHROPIC".parse::<ProviderKind>().unwrap(),
            ProviderKind::Anthropic
        );
    }

    #[test]
    fn test_unknown_names_fail() {
        for name in ["", "gemini", "open ai", "openai2", "claude", " anthropic"] {
            let err = create_provider(name, &ProviderSettings::default())
                .err()
                .expect("unknown provider should fail");
            match err {
                ThinkError::UnknownProvider(got) => assert_eq!(got, name),
                other => panic!("unexpected error for {name:?}: {other}"),
            }
        }
    }

    #[test]
    fn test_factory_builds_each_vendor() {
        for kind in ProviderKind::ALL {
            let provider = create_provider(kind.as_str(), &ProviderSettings::default()).unwrap();
            assert_eq!(provider.name(), kind.display_name());
            assert_eq!(provider.default_model(), kind.default_model());
            assert!(provider.supports_streaming());
        }
    }

    #[test]
    fn test_vendor_default_models() {
        assert_eq!(ProviderKind::OpenAi.default_model(), "gpt-4");
        assert_eq!(
            ProviderKind::Anthropic.default_model(),
            "claude-3-opus-20240229"
        );
    }
}
