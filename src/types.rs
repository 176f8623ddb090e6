//! Request types that flow from the command line to the providers.

/// What the caller asked for. Every field is optional; gaps are filled
/// from the config store by the processor.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Prompt given on the command line
    pub prompt: Option<String>,
    /// Text piped in on stdin
    pub input: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Explicit API key; stored for the provider when supplied
    pub api_key: Option<String>,
}

/// A fully resolved request, ready to hand to a provider.
///
/// Only the processor builds these, after it has found a non-empty prompt
/// and an API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    full_prompt: String,
    model: Option<String>,
    api_key: String,
}

impl ResolvedRequest {
    pub(crate) fn new(full_prompt: String, model: Option<String>, api_key: String) -> Self {
        debug_assert!(!full_prompt.is_empty());
        debug_assert!(!api_key.is_empty());
        Self {
            full_prompt,
            model,
            api_key,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.full_prompt
    }

    /// The model to use, or `None` to fall back to the provider's default.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}
