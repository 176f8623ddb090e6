//! Anthropic (Claude) LLM provider implementation.
//!
//! This module implements the `LlmProvider` trait for the Anthropic Messages API.
//!
//! Key concepts:
//! - **Messages API**: POST https://api.anthropic.com/v1/messages
//! - **Auth**: the key goes in an `x-api-key` header together with a pinned
//!   `anthropic-version`; `max_tokens` is mandatory on every request
//! - **Response format**: content is an array of "content blocks"; the
//!   answer is the text of the first block
//! - **Streaming**: server-sent events; text arrives in
//!   `content_block_delta` events and the stream ends with `message_stop`

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::http_errors::{request_error, status_error};
use super::sse::SseBuffer;
use super::{ChunkCallback, LlmProvider, NO_RESPONSE, TEMPERATURE};
use crate::error::{Result, ThinkError};
use crate::types::ResolvedRequest;

pub const PROVIDER_NAME: &str = "Anthropic";
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";
/// Output cap sent with every request. Not configurable.
pub const MAX_TOKENS: u32 = 1000;

/// Anthropic API client.
pub struct AnthropicProvider {
    api_base: String,
    client: reqwest::Client,
}

// --- API Request Types ---
// These match the Anthropic Messages API format

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ApiMessage<'a>>,
    temperature: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

// --- API Response Types ---

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    /// tool_use, thinking and anything newer
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

// --- Streaming Event Types ---

#[derive(Deserialize, Debug)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    delta: Option<StreamDelta>,
    error: Option<StreamErrorBody>,
}

#[derive(Deserialize, Debug)]
struct StreamDelta {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamErrorBody {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

// --- Implementation ---

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, api_base: Option<String>) -> Self {
        Self {
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client,
        }
    }

    fn url(&self) -> String {
        format!("{}/v1/messages", self.api_base.trim_end_matches('/'))
    }

    fn build_api_request<'a>(&'a self, request: &'a ResolvedRequest, stream: bool) -> ApiRequest<'a> {
        ApiRequest {
            model: self.model_for(request),
            max_tokens: MAX_TOKENS,
            messages: vec![ApiMessage {
                role: "user",
                content: request.prompt(),
            }],
            temperature: TEMPERATURE,
            stream,
        }
    }

    async fn send(&self, request: &ResolvedRequest, stream: bool) -> Result<reqwest::Response> {
        let url = self.url();
        let body = self.build_api_request(request, stream);
        debug!(url = %url, model = %body.model, stream, "sending anthropic request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", request.api_key())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(url = %url, error = %err, "anthropic request failed");
                request_error(PROVIDER_NAME, err, &url)
            })?;

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "anthropic returned non-success status");
            return Err(status_error(PROVIDER_NAME, response).await);
        }
        Ok(response)
    }
}

/// The text of the first content block, when that block is non-empty text.
fn first_block_text(api_response: ApiResponse) -> Option<String> {
    match api_response.content.into_iter().next()? {
        ContentBlock::Text { text } if !text.is_empty() => Some(text),
        _ => None,
    }
}

/// Handle one streamed `data:` payload. Returns `false` once the message is complete.
fn handle_stream_data(data: &str, on_chunk: &mut ChunkCallback<'_>) -> Result<bool> {
    let event: StreamEvent = serde_json::from_str(data.trim()).map_err(|e| {
        ThinkError::provider(PROVIDER_NAME, format!("Invalid stream event: {}", e))
    })?;

    match event.kind.as_str() {
        "content_block_delta" => {
            if let Some(text) = event
                .delta
                .as_ref()
                .and_then(|delta| delta.text.as_deref())
                .filter(|text| !text.is_empty())
            {
                on_chunk(text);
            }
            Ok(true)
        }
        "message_stop" => Ok(false),
        "error" => {
            let message = match event.error {
                Some(body) => format!("{}: {}", body.kind, body.message),
                None => "stream reported an error".to_string(),
            };
            Err(ThinkError::provider(PROVIDER_NAME, message))
        }
        _ => Ok(true),
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }

    async fn generate_response(&self, request: &ResolvedRequest) -> Result<String> {
        let url = self.url();
        let response = self.send(request, false).await?;
        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|err| request_error(PROVIDER_NAME, err, &url))?;

        let text = first_block_text(api_response);
        debug!(response_len = text.as_ref().map_or(0, String::len), "received anthropic response");
        Ok(text.unwrap_or_else(|| NO_RESPONSE.to_string()))
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    async fn stream_response(
        &self,
        request: &ResolvedRequest,
        on_chunk: &mut ChunkCallback<'_>,
    ) -> Result<()> {
        let url = self.url();
        let response = self.send(request, true).await?;
        let mut byte_stream = response.bytes_stream();
        let mut buffer = SseBuffer::new();

        while let Some(chunk_result) = byte_stream.next().await {
            let bytes = chunk_result.map_err(|err| request_error(PROVIDER_NAME, err, &url))?;
            buffer.push(&bytes);
            while let Some(data) = buffer.next_data() {
                if !handle_stream_data(&data, on_chunk)? {
                    return Ok(());
                }
            }
        }
        if let Some(data) = buffer.finish() {
            handle_stream_data(&data, on_chunk)?;
        }
        Ok(())
    }
}
