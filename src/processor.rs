//! Request dispatch.
//!
//! The processor turns `RequestOptions` into a `ResolvedRequest` and hands
//! it to the selected provider:
//!
//! ```text
//! RequestOptions ──> provider name  (explicit > stored default > "openai")
//!                ──> API key        (explicit, saved to config > stored > error)
//!                ──> model          (explicit > stored default > provider default)
//!                ──> prompt         (prompt + "\n\n" + piped input)
//!                ──> LlmProvider::generate_response / stream_response
//! ```
//!
//! The steps run in that order. In particular, an explicitly supplied key
//! is saved before the provider name is validated.

use std::time::Duration;
use tracing::debug;

use crate::config::ConfigStore;
use crate::error::{Result, ThinkError};
use crate::llm::{self, ChunkCallback, LlmProvider, ProviderSettings};
use crate::prompt::combine_prompt;
use crate::types::{RequestOptions, ResolvedRequest};

/// Builds provider instances by name.
pub trait ProviderFactory {
    fn create(&self, name: &str, settings: &ProviderSettings) -> Result<Box<dyn LlmProvider>>;
}

/// The real vendors, optionally with a request deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct VendorFactory {
    pub timeout: Option<Duration>,
}

impl ProviderFactory for VendorFactory {
    fn create(&self, name: &str, settings: &ProviderSettings) -> Result<Box<dyn LlmProvider>> {
        let settings = ProviderSettings {
            timeout: settings.timeout.or(self.timeout),
            ..settings.clone()
        };
        llm::create_provider(name, &settings)
    }
}

pub struct Processor<'a, F = VendorFactory> {
    store: &'a mut ConfigStore,
    factory: F,
}

impl<'a> Processor<'a, VendorFactory> {
    pub fn new(store: &'a mut ConfigStore) -> Self {
        Self {
            store,
            factory: VendorFactory::default(),
        }
    }
}

impl<'a, F: ProviderFactory> Processor<'a, F> {
    pub fn with_factory(store: &'a mut ConfigStore, factory: F) -> Self {
        Self { store, factory }
    }

    /// Resolve provider name, key, model and prompt, saving an explicit key.
    pub fn resolve(&mut self, options: &RequestOptions) -> Result<(String, ResolvedRequest)> {
        let provider = non_empty(options.provider.as_deref())
            .unwrap_or_else(|| self.store.default_provider())
            .to_string();

        let api_key = match non_empty(options.api_key.as_deref()) {
            Some(key) => {
                self.store.set_api_key(&provider, key)?;
                debug!(provider = %provider, "saved API key from command line");
                key.to_string()
            }
            None => self
                .store
                .api_key(&provider)
                .map(str::to_string)
                .ok_or_else(|| ThinkError::MissingApiKey {
                    provider: provider.clone(),
                })?,
        };

        let model = non_empty(options.model.as_deref())
            .or_else(|| self.store.default_model(&provider))
            .map(str::to_string);

        let full_prompt = combine_prompt(options.prompt.as_deref(), options.input.as_deref())
            .ok_or(ThinkError::MissingInput)?;

        debug!(
            provider = %provider,
            model = model.as_deref().unwrap_or("<provider default>"),
            prompt_len = full_prompt.len(),
            "resolved request"
        );
        Ok((provider, ResolvedRequest::new(full_prompt, model, api_key)))
    }

    fn provider_for(&self, name: &str) -> Result<Box<dyn LlmProvider>> {
        let settings = ProviderSettings {
            api_base: self.store.api_base(name).map(str::to_string),
            timeout: None,
        };
        self.factory.create(name, &settings)
    }

    /// Send the request and return the complete answer.
    pub async fn process_input(&mut self, options: &RequestOptions) -> Result<String> {
        let (provider_name, request) = self.resolve(options)?;
        let provider = self.provider_for(&provider_name)?;
        provider.generate_response(&request).await
    }

    /// Send the request and pass the answer to `on_chunk` piece by piece.
    pub async fn stream_input(
        &mut self,
        options: &RequestOptions,
        on_chunk: &mut ChunkCallback<'_>,
    ) -> Result<()> {
        let (provider_name, request) = self.resolve(options)?;
        let provider = self.provider_for(&provider_name)?;
        if !provider.supports_streaming() {
            return Err(ThinkError::UnsupportedOperation {
                provider: provider_name,
            });
        }
        provider.stream_response(&request, on_chunk).await
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
