//! OpenAI chat-completions provider.

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::http_errors::{request_error, status_error};
use super::sse::SseBuffer;
use super::{ChunkCallback, LlmProvider, NO_RESPONSE, TEMPERATURE};
use crate::error::{Result, ThinkError};
use crate::types::ResolvedRequest;

pub const PROVIDER_NAME: &str = "OpenAI";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    api_base: String,
    client: reqwest::Client,
}

// --- API Request Types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
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
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize, Debug)]
struct ApiChoice {
    message: Option<ApiResponseMessage>,
}

#[derive(Deserialize, Debug)]
struct ApiResponseMessage {
    content: Option<String>,
}

// --- Streaming Response Types ---

#[derive(Deserialize, Debug)]
struct StreamResponseChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamErrorBody>,
}

#[derive(Deserialize, Debug)]
struct StreamErrorBody {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Deserialize, Debug)]
struct StreamDelta {
    content: Option<String>,
}

// --- Implementation ---

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, api_base: Option<String>) -> Self {
        Self {
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client,
        }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    fn build_api_request<'a>(&'a self, request: &'a ResolvedRequest, stream: bool) -> ApiRequest<'a> {
        ApiRequest {
            model: self.model_for(request),
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
        debug!(url = %url, model = %body.model, stream, "sending openai request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(request.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(url = %url, error = %err, "openai request failed");
                request_error(PROVIDER_NAME, err, &url)
            })?;

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "openai returned non-success status");
            return Err(status_error(PROVIDER_NAME, response).await);
        }
        Ok(response)
    }
}

/// Text of the first choice, if any.
fn first_choice_text(api_response: ApiResponse) -> Option<String> {
    api_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.is_empty())
}

/// Handle one streamed `data:` payload. Returns `false` once the stream is done.
fn handle_stream_data(data: &str, on_chunk: &mut ChunkCallback<'_>) -> Result<bool> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(false);
    }
    let chunk: StreamResponseChunk = serde_json::from_str(data).map_err(|e| {
        ThinkError::provider(PROVIDER_NAME, format!("Invalid stream chunk: {}", e))
    })?;
    if let Some(error) = chunk.error {
        let message = match error.kind {
            Some(kind) => format!("{}: {}", kind, error.message),
            None => error.message,
        };
        return Err(ThinkError::provider(PROVIDER_NAME, message));
    }
    if let Some(text) = chunk
        .choices
        .first()
        .and_then(|choice| choice.delta.as_ref())
        .and_then(|delta| delta.content.as_deref())
        .filter(|text| !text.is_empty())
    {
        on_chunk(text);
    }
    Ok(true)
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
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

        let content = first_choice_text(api_response);
        debug!(response_len = content.as_ref().map_or(0, String::len), "received openai response");
        Ok(content.unwrap_or_else(|| NO_RESPONSE.to_string()))
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
