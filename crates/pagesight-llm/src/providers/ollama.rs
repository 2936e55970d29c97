//! Ollama local LLM provider implementation.

use super::common::{build_http_client, convert_role_standard, decode_image, send_json};
use crate::error::Result;
use crate::provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ProviderCapabilities, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_MODEL: &str = "llava";
const DEFAULT_URL: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama local LLM provider.
///
/// Talks to the `/api/chat` endpoint of a local Ollama instance. Images are
/// sent as raw base64 in each message's `images` array, which vision models
/// such as LLaVA consume directly.
pub struct OllamaProvider {
    model: String,
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default settings.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL)
    }

    /// Create a new Ollama provider with a specific model.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_model(model: impl Into<String>) -> Result<Self> {
        Self::with_url(DEFAULT_URL, model)
    }

    /// Create a new Ollama provider with custom URL and model.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_url(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, model, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a new Ollama provider with custom URL, model and request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            model: model.into(),
            client: build_http_client(Some(timeout_secs))?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    /// Convert internal request to Ollama chat API format.
    fn to_api_request(&self, request: &CompletionRequest) -> Result<OllamaRequest> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system_prompt {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: system.clone(),
                images: Vec::new(),
            });
        }

        for message in &request.messages {
            let images = message
                .images
                .iter()
                .map(|uri| decode_image(uri).map(|image| image.data().to_string()))
                .collect::<Result<Vec<_>>>()?;

            messages.push(OllamaMessage {
                role: convert_role_standard(message.role),
                content: message.content.clone(),
                images,
            });
        }

        Ok(OllamaRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request
                    .max_tokens
                    .map(i32::try_from)
                    .transpose()
                    .ok()
                    .flatten(),
            },
        })
    }

    /// Convert Ollama API response to internal format.
    fn convert_api_response(response: OllamaResponse) -> CompletionResponse {
        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(input_tokens), Some(output_tokens)) => Some(Usage {
                input_tokens,
                output_tokens,
            }),
            _ => None,
        };

        CompletionResponse {
            content: response.message.content,
            model: response.model,
            stop_reason: if response.done {
                Some(response.done_reason.unwrap_or_else(|| "stop".to_string()))
            } else {
                None
            },
            usage,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_request = self.to_api_request(&request)?;

        tracing::debug!(
            "Ollama chat request to {} (model: {}, images: {})",
            self.base_url,
            self.model,
            request.messages.iter().map(|m| m.images.len()).sum::<usize>()
        );

        let http_request = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&api_request);

        let api_response: OllamaResponse =
            send_json(http_request, "ollama", self.timeout_secs).await?;

        Ok(Self::convert_api_response(api_response))
    }

    fn capabilities(&self) -> ProviderCapabilities {
        // Vision support depends on the pulled model; the default (llava) has it
        ProviderCapabilities {
            max_context_tokens: 4096,
            is_local: true,
            supports_vision: true,
            model_name: self.model.clone(),
        }
    }

    fn provider_id(&self) -> &'static str {
        "ollama"
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    message: OllamaMessage,
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}
